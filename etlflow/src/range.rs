//! Stage range expressions.
//!
//! A sub-pipeline reference may select a contiguous slice of the target
//! pipeline's stages with a Python-slice expression such as `2:30` or
//! `2:-1` (negative indices count from the end). An empty expression means
//! the full range. Malformed expressions must never abort the pipeline:
//! they are reported through the diagnostic sink and degrade to "run
//! everything".

use crate::diagnostics::DiagnosticSink;

/// A resolved `[start, end)` slice over a specific pipeline's stage list.
///
/// Bounds are normalized against the stage count at resolution time, so
/// `0 <= start <= end <= count` always holds; the range may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRange {
    start: usize,
    end: usize,
}

impl StageRange {
    /// The full range over `count` stages.
    #[must_use]
    pub fn full(count: usize) -> Self {
        Self {
            start: 0,
            end: count,
        }
    }

    /// Normalizes signed bounds against `count`.
    ///
    /// Out-of-bounds and inverted bounds collapse toward an empty range
    /// rather than erroring: the selected span is
    /// `skip(max(start, 0)).take(max(end - start, 0))`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn from_signed(start: i64, end: i64, count: usize) -> Self {
        let n = i64::try_from(count).unwrap_or(i64::MAX);
        let lo = start.clamp(0, n);
        let span = end.saturating_sub(start).max(0);
        let hi = n.min(lo.saturating_add(span));
        Self {
            start: lo as usize,
            end: hi as usize,
        }
    }

    /// The inclusive start index.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The exclusive end index.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of selected positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if no positions are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slices a stage list to the selected range.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start.min(items.len())..self.end.min(items.len())]
    }
}

/// Resolves a range expression against a stage count.
///
/// Grammar: the empty string selects the full range; otherwise two
/// colon-separated integers `a:b`, where negatives resolve as `count + a`.
/// Anything else selects the full range and reports one diagnostic.
#[must_use]
pub fn resolve_range(expr: &str, count: usize, diagnostics: &dyn DiagnosticSink) -> StageRange {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return StageRange::full(count);
    }

    let tokens: Vec<&str> = trimmed.split(':').collect();
    if tokens.len() != 2 {
        diagnostics.report_error(&format!(
            "invalid stage range expression '{expr}': expected 'start:end'; running the full range"
        ));
        return StageRange::full(count);
    }

    match (
        tokens[0].trim().parse::<i64>(),
        tokens[1].trim().parse::<i64>(),
    ) {
        (Ok(a), Ok(b)) => {
            let n = i64::try_from(count).unwrap_or(i64::MAX);
            let start = if a < 0 { n + a } else { a };
            let end = if b < 0 { n + b } else { b };
            StageRange::from_signed(start, end, count)
        }
        _ => {
            diagnostics.report_error(&format!(
                "invalid stage range expression '{expr}': bounds must be integers; running the full range"
            ));
            StageRange::full(count)
        }
    }
}
