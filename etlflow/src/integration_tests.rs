//! End-to-end tests: registry lookup, range resolution, composition, and
//! the invocation modes working together over one named pipeline.

use crate::prelude::*;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::Once;

/// Routes the engine's tracing output through the test harness once per
/// process, so diagnostics from these tests land in captured output.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("etlflow=debug")
            .with_test_writer()
            .try_init();
    });
}

fn doc(pairs: &[(&str, &str)]) -> Document {
    let mut d = Document::new();
    for (k, v) in pairs {
        d.set(*k, *v);
    }
    d
}

/// A pipeline imitating a scraper flow: expand a listing document into
/// detail rows, then annotate each row.
fn scraper_registry() -> Arc<InMemoryRegistry> {
    let expand: Arc<dyn Stage> = Arc::new(FnStage::new(
        "expand-listing",
        StageKind::Generator,
        |batch, _| {
            let mut out = Vec::new();
            for d in batch {
                for page in 0..2 {
                    let mut row = Document::new();
                    row.set("page", page);
                    row.set("listing", d.text_of("url"));
                    out.push(row);
                }
            }
            Ok(out)
        },
    ));
    let annotate: Arc<dyn Stage> = Arc::new(FnStage::new(
        "annotate",
        StageKind::Transformer,
        |batch, live| {
            Ok(batch
                .into_iter()
                .map(|mut d| {
                    d.set("fetched", live);
                    d
                })
                .collect())
        },
    ));
    let persist: Arc<dyn Stage> = Arc::new(FnStage::new(
        "persist",
        StageKind::Executor,
        |batch, _| Ok(batch),
    ));

    let registry = Arc::new(InMemoryRegistry::new());
    registry.register("scrape-details", vec![expand, annotate, persist]);
    registry
}

#[tokio::test]
async fn test_generate_through_resolved_sub_pipeline() {
    init_tracing();
    let registry = scraper_registry();
    let selection = SubPipelineRef::new(registry, "scrape-details")
        .resolve()
        .await
        .unwrap();
    assert_eq!(selection.len(), 3);

    let generate = Generate::new(selection.compose(true));
    let out: Vec<Document> = generate
        .run(Some(doc(&[("url", "https://example.com/list")])))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].text_of("listing"), "https://example.com/list");
    assert_eq!(out[0].get("fetched"), Some(&serde_json::json!(true)));
}

#[tokio::test]
async fn test_range_narrows_the_composed_stages() {
    let registry = scraper_registry();
    // Skip the generator, keep annotate and persist.
    let selection = SubPipelineRef::new(registry, "scrape-details")
        .with_range("1:3")
        .resolve()
        .await
        .unwrap();
    assert_eq!(selection.stage_names(), vec!["annotate", "persist"]);

    // Without the generator, one input maps to one annotated output.
    let out: Vec<Document> = Transform::new(selection.compose(false))
        .run(docs_to_stream(vec![doc(&[("page", "9")])]))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get("fetched"), Some(&serde_json::json!(false)));
}

#[tokio::test]
async fn test_execute_taps_the_pipeline_per_document() {
    let registry = scraper_registry();
    let selection = SubPipelineRef::new(registry, "scrape-details")
        .resolve()
        .await
        .unwrap();

    let scheduler = Arc::new(RecordingScheduler::new());
    let execute = Execute::new(selection.compose(true), scheduler.clone())
        .with_key_field("url")
        .deferred();

    let inputs = vec![
        doc(&[("url", "one")]),
        doc(&[("url", "two")]),
        doc(&[("url", "three")]),
    ];
    let out: Vec<Document> = execute
        .run(docs_to_stream(inputs.clone()))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(out, inputs);
    assert_eq!(
        scheduler.task_names(),
        vec!["etl-one", "etl-two", "etl-three"]
    );
}

#[tokio::test]
async fn test_transform_merges_source_fields_across_fan_out() {
    let registry = scraper_registry();
    let selection = SubPipelineRef::new(registry, "scrape-details")
        .resolve()
        .await
        .unwrap();

    let mode = Transform::new(selection.compose(true)).with_merge_fields("category");
    let inputs = vec![
        doc(&[("url", "a"), ("category", "books")]),
        doc(&[("url", "b"), ("category", "games")]),
    ];
    let out: Vec<Document> = mode
        .run(docs_to_stream(inputs))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(out.len(), 4);
    let categories: Vec<String> = out.iter().map(|d| d.text_of("category")).collect();
    assert_eq!(categories, vec!["books", "books", "games", "games"]);
}

#[tokio::test]
async fn test_generated_rows_pivot_into_a_summary() {
    let registry = scraper_registry();
    let selection = SubPipelineRef::new(registry, "scrape-details")
        .resolve()
        .await
        .unwrap();

    let generated = Generate::new(selection.compose(true))
        .run(Some(doc(&[("url", "https://example.com")])));
    let pivoted: Vec<Document> = PivotReshaper::new("page")
        .run(generated)
        .try_collect()
        .await
        .unwrap();

    // Rows: listing, fetched. Columns: the page values "0" and "1".
    assert_eq!(pivoted.len(), 2);
    assert_eq!(pivoted[0].keys().collect::<Vec<_>>(), vec!["0", "1"]);
}

#[tokio::test]
async fn test_missing_pipeline_fails_initialization() {
    let registry = scraper_registry();
    let err = SubPipelineRef::new(registry, "does-not-exist")
        .resolve()
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "no pipeline named 'does-not-exist' is registered"
    );
}
