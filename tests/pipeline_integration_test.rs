mod common;

use std::sync::Arc;

use common::{shard, write_shard, InMemoryCatalog};
use xporter::domain::models::{GroupOutcome, GroupState, SkipReason};
use xporter::{Config, PipelineOptions, ReportError, ReportPipeline, ReportingSession};

const CART_SPEC: &str = "cypress/e2e/shop/cart/cart.cy.js";

fn cart_shard() -> serde_json::Value {
    shard(
        CART_SPEC,
        "Cart [P2][S4]",
        &[
            ("adds item [C10]", "passed"),
            ("removes item [C11]", "failed"),
            ("applies coupon [C99]", "passed"),
            ("untagged", "passed"),
        ],
    )
}

#[tokio::test]
async fn test_merges_shards_across_directories() {
    let root = tempfile::tempdir().unwrap();
    write_shard(
        &root.path().join("a"),
        "mochawesome.json",
        &shard(CART_SPEC, "Cart", &[("one", "passed"), ("two", "passed"), ("three", "failed")]),
    );
    write_shard(
        &root.path().join("b"),
        "mochawesome_002.json",
        &shard("cypress/e2e/shop/login.cy.js", "Login", &[("four", "passed"), ("five", "passed")]),
    );

    let report = ReportPipeline::new(Config::default())
        .run(&mut ReportingSession::new(), &PipelineOptions::new(root.path()))
        .await
        .unwrap();

    assert_eq!(report.shard_files.len(), 2);
    assert_eq!(report.stats.tests, 5);
    assert_eq!(report.stats.passes, 4);
    assert!((report.stats.pass_percent - 80.0).abs() < 1e-9);
    assert_eq!((report.passed, report.failed), (4, 1));
    assert!(report.merged_path.unwrap().exists());
}

#[tokio::test]
async fn test_normal_mode_creates_posts_and_closes() {
    let root = tempfile::tempdir().unwrap();
    write_shard(root.path(), "mochawesome.json", &cart_shard());
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[(10, 4), (11, 4)]));

    let report = ReportPipeline::new(Config::default())
        .with_catalog(catalog.clone())
        .run(&mut ReportingSession::new(), &PipelineOptions::new(root.path()))
        .await
        .unwrap();

    assert_eq!(report.unreportable, 1);

    let runs = catalog.created_runs();
    assert_eq!(runs.len(), 1);
    let (run_id, project_id, new_run) = &runs[0];
    assert_eq!(*project_id, 2);
    assert_eq!(new_run.suite_id, 4);
    assert!(!new_run.include_all);
    assert_eq!(new_run.case_ids, vec![10, 11]);
    assert!(new_run.name.starts_with("SHOP-CART Automated Run ("));

    let posts = catalog.posts();
    assert_eq!(posts.len(), 1);
    let (posted_run, entries) = &posts[0];
    assert_eq!(posted_run, run_id);
    let mut entries = entries.clone();
    entries.sort_by_key(|e| e.case_id);
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].case_id, entries[0].status_id), (10, 1));
    assert_eq!(entries[0].comment, "Test passed");
    assert_eq!((entries[1].case_id, entries[1].status_id), (11, 5));
    assert_eq!(entries[1].comment, "AssertionError: removes item [C11]");

    assert_eq!(catalog.closes(), vec![*run_id]);

    let summary = report.runs.unwrap();
    match &summary.groups[..] {
        [GroupOutcome::Completed(group)] => {
            assert_eq!(group.posted, 2);
            assert_eq!(group.final_state, GroupState::Closed);
        }
        other => panic!("unexpected groups: {other:?}"),
    }
}

#[tokio::test]
async fn test_two_invocations_share_one_run() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_shard(first.path(), "mochawesome.json", &cart_shard());
    write_shard(
        second.path(),
        "mochawesome.json",
        &shard(CART_SPEC, "Cart [P2][S4]", &[("adds item again [C10]", "failed")]),
    );
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[(10, 4), (11, 4)]));
    let pipeline = ReportPipeline::new(Config::default()).with_catalog(catalog.clone());
    let mut session = ReportingSession::new();

    pipeline
        .run(&mut session, &PipelineOptions::new(first.path()))
        .await
        .unwrap();
    pipeline
        .run(&mut session, &PipelineOptions::new(second.path()))
        .await
        .unwrap();

    let runs = catalog.created_runs();
    assert_eq!(runs.len(), 1, "the second invocation must reuse the run");
    let run_id = runs[0].0;
    let posts = catalog.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|(id, _)| *id == run_id));
    assert_eq!(catalog.closes(), vec![run_id]);
}

#[tokio::test]
async fn test_adhoc_mode_only_posts_run_members() {
    let root = tempfile::tempdir().unwrap();
    write_shard(root.path(), "mochawesome.json", &cart_shard());
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[(10, 4), (11, 4)]).with_run(900, &[10]));
    let options = PipelineOptions {
        adhoc_run_id: Some(900),
        ..PipelineOptions::new(root.path())
    };

    let report = ReportPipeline::new(Config::default())
        .with_catalog(catalog.clone())
        .run(&mut ReportingSession::new(), &options)
        .await
        .unwrap();

    assert!(catalog.created_runs().is_empty());
    assert!(catalog.closes().is_empty());
    let posts = catalog.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, 900);
    let posted: Vec<u64> = posts[0].1.iter().map(|e| e.case_id).collect();
    assert_eq!(posted, vec![10]);

    let summary = report.runs.unwrap();
    assert_eq!(summary.posted_count(), 1);
}

#[tokio::test]
async fn test_adhoc_run_without_matching_cases_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    write_shard(root.path(), "mochawesome.json", &cart_shard());
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[]).with_run(901, &[7777]));
    let options = PipelineOptions {
        adhoc_run_id: Some(901),
        ..PipelineOptions::new(root.path())
    };

    let report = ReportPipeline::new(Config::default())
        .with_catalog(catalog.clone())
        .run(&mut ReportingSession::new(), &options)
        .await
        .unwrap();

    assert!(catalog.posts().is_empty());
    let summary = report.runs.unwrap();
    assert!(matches!(
        &summary.groups[..],
        [GroupOutcome::Skipped {
            reason: SkipReason::NoMatchingCases,
            ..
        }]
    ));
}

#[tokio::test]
async fn test_adhoc_mode_posts_outcomes_without_project() {
    let root = tempfile::tempdir().unwrap();
    write_shard(
        root.path(),
        "mochawesome.json",
        &shard("cypress/e2e/shop/cart/a.cy.js", "Cart", &[("adds item [C10]", "passed")]),
    );
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[]).with_run(900, &[10]));
    let options = PipelineOptions {
        adhoc_run_id: Some(900),
        ..PipelineOptions::new(root.path())
    };

    let report = ReportPipeline::new(Config::default())
        .with_catalog(catalog.clone())
        .run(&mut ReportingSession::new(), &options)
        .await
        .unwrap();

    assert_eq!(report.unreportable, 0);
    let posts = catalog.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, 900);
    let posted: Vec<u64> = posts[0].1.iter().map(|e| e.case_id).collect();
    assert_eq!(posted, vec![10]);
}

#[tokio::test]
async fn test_unparseable_shard_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    write_shard(root.path(), "mochawesome.json", &cart_shard());
    std::fs::write(root.path().join("mochawesome_2.json"), "{ not json").unwrap();
    let catalog = Arc::new(InMemoryCatalog::with_cases(&[(10, 4), (11, 4)]));

    let err = ReportPipeline::new(Config::default())
        .with_catalog(catalog.clone())
        .run(&mut ReportingSession::new(), &PipelineOptions::new(root.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Parse { .. }));
    assert!(catalog.created_runs().is_empty());
    assert!(catalog.posts().is_empty());
}

#[tokio::test]
async fn test_empty_root_is_fatal() {
    let root = tempfile::tempdir().unwrap();

    let err = ReportPipeline::new(Config::default())
        .run(&mut ReportingSession::new(), &PipelineOptions::new(root.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::NoReportFiles { .. }));
}
