//! Benchmarks for the two hottest pure-function paths: eligibility
//! evaluation (run once per repo on every List view refresh) and plan
//! building (run once per queued action).

use bbfix_api::{Action, RiskSnapshot};
use bbfix_fixtures::{repo_metadata, repo_record};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_evaluate(c: &mut Criterion) {
    let repo = repo_record("software/api", "/tmp/api");
    let metadata = repo_metadata("software/api");
    let risk = RiskSnapshot::default();

    c.bench_function("evaluate_clean_repo", |b| {
        b.iter(|| {
            let eligible = bbfix_core::evaluate(
                black_box(&repo),
                black_box(&metadata),
                black_box(&risk),
                black_box(true),
            );
            black_box(eligible);
        })
    });
}

fn bench_build_plan(c: &mut Criterion) {
    let repo = repo_record("software/api", "/tmp/api");
    let metadata = repo_metadata("software/api");
    let options = bbfix_core::plan::PlanOptions::default();
    let ctx = bbfix_core::plan::PlanContext {
        repo: &repo,
        metadata: &metadata,
        options: &options,
        fetch_prune_enabled: true,
    };

    c.bench_function("build_plan_push", |b| {
        b.iter(|| {
            let entries = bbfix_core::plan::build_plan(black_box(Action::Push), black_box(&ctx));
            black_box(entries);
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_build_plan);
criterion_main!(benches);
