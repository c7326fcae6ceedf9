use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use yipyap_votes::{
    core::manager::OptimisticUpdateManager,
    types::{TargetRef, VoteDirection},
};

fn target(i: u64) -> TargetRef {
    if i % 2 == 0 {
        TargetRef::post(format!("p{i}"))
    } else {
        TargetRef::comment(format!("c{i}"))
    }
}

fn bench_apply_confirm(c: &mut Criterion) {
    c.bench_function("apply_confirm_50k", |b| {
        b.iter(|| {
            let mut mgr = OptimisticUpdateManager::new();
            for i in 0..50_000u64 {
                let applied = mgr.apply_optimistic_vote(target(i % 500), Some(VoteDirection::Up), None, 0);
                mgr.confirm_operation(applied.operation_id);
            }
        });
    });
}

fn bench_rollback_burst(c: &mut Criterion) {
    c.bench_function("apply_then_rollback_10k", |b| {
        b.iter(|| {
            let mut mgr = OptimisticUpdateManager::new();
            let ids: Vec<_> = (0..10_000u64)
                .map(|i| {
                    mgr.apply_optimistic_vote(target(i), Some(VoteDirection::Down), None, 0)
                        .operation_id
                })
                .collect();
            for id in ids {
                let _ = mgr.rollback_operation(id);
            }
        });
    });
}

fn bench_pending_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_pending");
    for n in [10u64, 100, 1000] {
        let mut mgr = OptimisticUpdateManager::new();
        for i in 0..n {
            mgr.apply_optimistic_vote(target(i), Some(VoteDirection::Up), None, 0);
        }
        let queried = target(n / 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| mgr.is_pending(&queried));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply_confirm, bench_rollback_burst, bench_pending_query);
criterion_main!(benches);
