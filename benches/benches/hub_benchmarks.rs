use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nshub::{ChannelRegistry, Listener, MetaNotification, NamespaceNode};
use serde_json::json;

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let reg = ChannelRegistry::new("action");
    let listener: Listener = Listener::infallible(|_| {});
    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            reg.subscribe("chan", listener.clone());
            reg.unsubscribe(black_box("chan"), Some(&listener));
        })
    });
}

fn bench_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire");
    for subs in [1usize, 10, 100] {
        let reg = ChannelRegistry::new("event");
        for _ in 0..subs {
            reg.subscribe(
                "chan",
                Listener::infallible(|args| {
                    black_box(args);
                }),
            );
        }
        let args = [json!("x")];
        group.bench_with_input(BenchmarkId::from_parameter(subs), &subs, |b, _| {
            b.iter(|| reg.fire(black_box("chan"), &args))
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let root = NamespaceNode::new_root();
    let node = root
        .create_namespace("app")
        .and_then(|n| n.create_namespace("ui"))
        .unwrap();
    c.bench_function("resolve_relative", |b| {
        b.iter(|| node.resolve(black_box(":button:click")))
    });
}

/// Emit from increasingly deep nodes, every ancestor holding a generic listener.
fn bench_emit_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_propagation");
    for depth in [1usize, 4, 16] {
        let root = NamespaceNode::new_root();
        let mut node = root.clone();
        for i in 0..depth {
            node.on_any_action(Listener::infallible(|n: &MetaNotification| {
                black_box(n);
            }));
            node = node.create_namespace(&format!("n{i}")).unwrap();
        }
        node.on_action(":go", Listener::infallible(|_| {}));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| node.emit_action(black_box(":go"), &[json!(1)]))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_subscribe_unsubscribe,
    bench_fire,
    bench_resolve,
    bench_emit_propagation
);
criterion_main!(benches);
