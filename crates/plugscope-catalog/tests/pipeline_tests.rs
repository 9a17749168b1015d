// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline runs over in-memory sources.

use std::sync::Arc;
use std::time::Duration;

use plugscope_catalog::{Pipeline, RunStatus};
use plugscope_config::PlugscopeConfig;
use plugscope_core::{
    CandidateRejection, MaintenanceStatus, PlugscopeError, RepositorySignals, ScoreCategory,
    ServiceTier, SignalOutcome, SourceDescriptor, SourceKind, SubScore, UnresolvableReason,
};
use plugscope_test_utils::{CandidateBuilder, MemorySink, StaticSignalFetcher, StaticSource};
use tracing_test::traced_test;

fn descriptor(id: &str, kind: SourceKind) -> SourceDescriptor {
    SourceDescriptor {
        source_id: id.to_string(),
        kind,
        fetch_location: format!("https://example.test/{id}/index.json"),
        is_canonical: false,
        priority: 0,
    }
}

fn pipeline(source: StaticSource, fetcher: StaticSignalFetcher) -> Pipeline {
    Pipeline::new(&PlugscopeConfig::default(), Arc::new(fetcher))
        .unwrap()
        .with_adapter(Arc::new(source))
}

#[tokio::test]
async fn heavy_plugin_without_signals_scores_from_remaining_categories() {
    let candidate = CandidateBuilder::new("official", "0")
        .name("pr-review-toolkit")
        .version("1.0.0")
        .description("Comprehensive pull request review agents for code quality")
        .repository("https://github.com/anthropics/pr-review-toolkit")
        .files([
            "agents/code-reviewer.md",
            "agents/comment-analyzer.md",
            "agents/pr-test-analyzer.md",
            "agents/silent-failure-hunter.md",
            "agents/type-design-analyzer.md",
            "agents/code-simplifier.md",
            "commands/review-pr.md",
            "README.md",
        ])
        .build();
    let pipeline = pipeline(
        StaticSource::candidates(vec![candidate]),
        StaticSignalFetcher::new(),
    );

    let catalog = pipeline
        .run(&[descriptor("official", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert_eq!(catalog.len(), 1);
    let entity = &catalog.entities[0];
    assert_eq!(entity.inventory.agents, 6);
    assert_eq!(entity.inventory.commands, 1);
    assert_eq!(entity.requirements.tier, ServiceTier::Heavy);

    let quality = &entity.quality;
    assert_eq!(quality.maintenance.score, SubScore::Unscored);
    assert_eq!(quality.maintenance_status, MaintenanceStatus::Unknown);

    let weights = plugscope_core::ScoreWeights::default();
    let present = [
        ScoreCategory::Security,
        ScoreCategory::Documentation,
        ScoreCategory::Testing,
    ];
    let (sum, total) = present.iter().fold((0.0, 0.0), |(s, t), c| {
        let v = f64::from(quality.category(*c).score.value().unwrap());
        (s + v * weights.weight(*c), t + weights.weight(*c))
    });
    let overall = quality.overall.unwrap();
    assert!((overall - sum / total).abs() < 1e-9, "{overall} vs {}", sum / total);

    assert_eq!(catalog.summary.signals_unresolved.len(), 1);
    assert_eq!(
        catalog.summary.signals_unresolved[0].reason,
        UnresolvableReason::NotFound
    );
    assert_eq!(catalog.summary.outcome(), RunStatus::Complete);
}

#[tokio::test]
async fn two_sources_of_one_plugin_merge_to_the_newer_version() {
    let repo = "https://github.com/anthropics/claude-code";
    let candidates = vec![
        CandidateBuilder::new("official", "feature-dev")
            .canonical(true)
            .name("feature-dev")
            .version("1.0.0")
            .repository(repo)
            .build(),
        CandidateBuilder::new("community", "12")
            .name("feature-dev")
            .version("1.2.0")
            .repository(repo)
            .build(),
    ];
    let fetcher = StaticSignalFetcher::new().with(
        repo,
        SignalOutcome::resolved(RepositorySignals {
            last_commit: Some(chrono::Utc::now() - chrono::Duration::days(3)),
            commits_90d: Some(40),
            ..Default::default()
        }),
    );
    let catalog = pipeline(StaticSource::candidates(candidates), fetcher)
        .run(&[descriptor("marketplaces", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert_eq!(catalog.len(), 1);
    let entity = &catalog.entities[0];
    assert_eq!(entity.manifest.version, "1.2.0");
    assert_eq!(entity.source_ids(), ["community", "official"]);
    assert_eq!(entity.canonical_source().unwrap().source_id, "community");
    assert_eq!(entity.quality.maintenance_status, MaintenanceStatus::Active);
    assert!(catalog.summary.signals_unresolved.is_empty());
}

#[tokio::test]
#[traced_test]
async fn one_malformed_entry_among_fifty_is_reported_by_raw_id() {
    let candidates = (0..50)
        .map(|i| {
            let builder = CandidateBuilder::new("community", &i.to_string());
            if i == 17 {
                builder.name("   ").build()
            } else {
                builder.name(&format!("plugin-{i}")).version("0.1.0").build()
            }
        })
        .collect();
    let catalog = pipeline(StaticSource::candidates(candidates), StaticSignalFetcher::new())
        .run(&[descriptor("community", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert_eq!(catalog.len(), 49);
    assert_eq!(catalog.summary.candidates_seen, 50);
    assert_eq!(catalog.summary.candidates_rejected.len(), 1);
    assert_eq!(catalog.summary.candidates_rejected[0].raw_id, "17");
    assert_eq!(catalog.summary.outcome(), RunStatus::Complete);
    assert!(logs_contain("candidate skipped"));
}

#[tokio::test]
async fn source_level_rejections_are_collected() {
    let source = StaticSource::new(vec![
        Ok(CandidateBuilder::new("idx", "0").name("ok").build()),
        Err(CandidateRejection::new("idx", "1", "entry is not an object")),
    ]);
    let catalog = pipeline(source, StaticSignalFetcher::new())
        .run(&[descriptor("idx", SourceKind::ManifestIndex)])
        .await
        .unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.summary.candidates_rejected,
        [CandidateRejection::new("idx", "1", "entry is not an object")]
    );
}

#[tokio::test]
async fn unavailable_source_makes_the_run_partial() {
    let pipeline = pipeline(
        StaticSource::candidates(vec![CandidateBuilder::new("a", "0").name("x").build()]),
        StaticSignalFetcher::new(),
    )
    .with_adapter(Arc::new(
        StaticSource::unavailable("HTTP 404").with_kind(SourceKind::GithubScan),
    ));

    let catalog = pipeline
        .run(&[
            descriptor("index", SourceKind::ManifestIndex),
            descriptor("scan", SourceKind::GithubScan),
        ])
        .await
        .unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.summary.sources_skipped.len(), 1);
    assert_eq!(catalog.summary.sources_skipped[0].source_id, "scan");
    assert_eq!(catalog.summary.outcome(), RunStatus::Partial);
    assert_eq!(catalog.summary.outcome().exit_code(), 3);
}

#[tokio::test]
async fn every_source_unavailable_is_a_failed_run_with_an_empty_catalog() {
    let catalog = pipeline(StaticSource::unavailable("dns failure"), StaticSignalFetcher::new())
        .run(&[descriptor("index", SourceKind::ManifestIndex)])
        .await
        .unwrap();
    assert!(catalog.is_empty());
    assert_eq!(catalog.summary.outcome(), RunStatus::Failed);
    assert_eq!(catalog.summary.outcome().exit_code(), 4);
}

#[tokio::test]
async fn configuration_problems_fail_before_any_fetch() {
    let fetcher = Arc::new(StaticSignalFetcher::new());
    let pipeline = Pipeline::new(&PlugscopeConfig::default(), fetcher.clone())
        .unwrap()
        .with_adapter(Arc::new(StaticSource::candidates(vec![
            CandidateBuilder::new("a", "0")
                .name("x")
                .repository("https://github.com/o/x")
                .build(),
        ])));

    let duplicate = pipeline
        .run(&[
            descriptor("a", SourceKind::ManifestIndex),
            descriptor("a", SourceKind::ManifestIndex),
        ])
        .await;
    assert!(matches!(duplicate, Err(PlugscopeError::Config(_))));

    let missing = pipeline
        .run(&[descriptor("scan", SourceKind::GithubScan)])
        .await;
    assert!(matches!(missing, Err(PlugscopeError::Config(_))));
    assert!(fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn deadline_degrades_signals_but_keeps_manifests() {
    let candidates = (0..3)
        .map(|i| {
            CandidateBuilder::new("slow", &i.to_string())
                .name(&format!("slow-{i}"))
                .version("1.0.0")
                .repository(&format!("https://github.com/o/slow-{i}"))
                .build()
        })
        .collect();
    let pipeline = pipeline(
        StaticSource::candidates(candidates),
        StaticSignalFetcher::new().with_delay(Duration::from_secs(120)),
    )
    .with_run_timeout(Some(Duration::from_secs(5)));

    let catalog = pipeline
        .run(&[descriptor("slow", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert_eq!(catalog.len(), 3);
    assert!(catalog.summary.timed_out);
    assert_eq!(catalog.summary.outcome(), RunStatus::Partial);
    for entity in &catalog.entities {
        assert_eq!(
            entity.signals,
            SignalOutcome::unresolvable(UnresolvableReason::Cancelled)
        );
        assert_eq!(entity.quality.maintenance.score, SubScore::Unscored);
        assert_eq!(entity.manifest.version, "1.0.0");
    }
    assert_eq!(catalog.summary.signals_unresolved.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn deadline_keeps_candidates_not_yet_pulled_from_the_source() {
    let candidates = (0..12)
        .map(|i| {
            CandidateBuilder::new("backlog", &i.to_string())
                .name(&format!("queued-{i}"))
                .repository(&format!("https://github.com/o/queued-{i}"))
                .build()
        })
        .collect();
    let mut config = PlugscopeConfig::default();
    config.pipeline.candidate_concurrency = 2;
    let pipeline = Pipeline::new(
        &config,
        Arc::new(StaticSignalFetcher::new().with_delay(Duration::from_secs(120))),
    )
    .unwrap()
    .with_adapter(Arc::new(StaticSource::candidates(candidates)))
    .with_run_timeout(Some(Duration::from_secs(5)));

    let catalog = pipeline
        .run(&[descriptor("backlog", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert!(catalog.summary.timed_out);
    assert_eq!(catalog.summary.candidates_seen, 12);
    assert_eq!(catalog.len(), 12);
    assert!(catalog.summary.candidates_rejected.is_empty());
    assert!(catalog.entities.iter().all(|entity| entity.signals
        == SignalOutcome::unresolvable(UnresolvableReason::Cancelled)));
    assert_eq!(catalog.summary.signals_unresolved.len(), 12);
}

#[tokio::test]
async fn catalog_publishes_every_entity_to_the_sink() {
    let candidates = ["alpha", "beta", "gamma"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            CandidateBuilder::new("idx", &i.to_string())
                .name(name)
                .build()
        })
        .collect();
    let catalog = pipeline(StaticSource::candidates(candidates), StaticSignalFetcher::new())
        .run(&[descriptor("idx", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    let sink = MemorySink::failing_on("beta");
    let report = catalog.publish(&sink).await;
    assert_eq!(report.upserted, 2);
    assert_eq!(report.failed[0].slug, "beta");
    for entity in sink.entities() {
        assert_eq!(catalog.get(&entity.identity_key), Some(&entity));
    }
}

#[tokio::test]
async fn repeated_runs_produce_identical_entities() {
    let build = || {
        vec![
            CandidateBuilder::new("a", "0")
                .name("Code Formatter")
                .version("2.0.0")
                .description("Formats source files")
                .files(["README.md", "commands/format.md", ".github/workflows/ci.yml"])
                .build(),
            CandidateBuilder::new("b", "0")
                .name("code_formatter")
                .version("1.0.0")
                .field("keywords", serde_json::json!(["Style"]))
                .build(),
        ]
    };
    let first = pipeline(StaticSource::candidates(build()), StaticSignalFetcher::new())
        .run(&[descriptor("a", SourceKind::ManifestIndex)])
        .await
        .unwrap();
    let second = pipeline(StaticSource::candidates(build()), StaticSignalFetcher::new())
        .run(&[descriptor("a", SourceKind::ManifestIndex)])
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.entities[0].slug, "code-formatter");
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn analyze_scores_a_single_candidate() {
    let pipeline = Pipeline::new(
        &PlugscopeConfig::default(),
        Arc::new(StaticSignalFetcher::new()),
    )
    .unwrap();
    let entity = pipeline
        .analyze(
            CandidateBuilder::new("local", ".")
                .name("hookify")
                .files(["hooks/hooks.json", "README.md"])
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(entity.slug, "hookify");
    assert_eq!(entity.provenance.len(), 1);

    let rejected = pipeline
        .analyze(CandidateBuilder::new("local", ".").build())
        .await;
    assert!(matches!(
        rejected,
        Err(PlugscopeError::CandidateInvalid { ref raw_id, .. }) if raw_id == "local:."
    ));
}
