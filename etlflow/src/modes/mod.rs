//! Invocation modes built on a composed transform.
//!
//! Four strategies drive a resolved sub-pipeline over an input document
//! stream:
//!
//! - [`Generate`] — lazy fan-out from an optional seed document
//! - [`Execute`] — side-effecting tap, immediate or deferred dispatch
//! - [`Transform`] — single-pass fan-out merged back with source fields,
//!   or a cyclic first-result chain bounded only by its stop field

mod execute;
mod generate;
mod transform;

pub use execute::Execute;
pub use generate::Generate;
pub use transform::Transform;
