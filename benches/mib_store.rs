use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use snmp_lab::clock::system_clock;
use snmp_lab::mib::{InterfaceSeed, MibSeed, oids};
use snmp_lab::{MibStore, Walk};

fn store(interfaces: usize) -> Arc<MibStore> {
    let seed = MibSeed {
        interfaces: (0..interfaces)
            .map(|i| InterfaceSeed::ethernet(format!("eth{}", i)))
            .collect(),
        ..MibSeed::default()
    };
    Arc::new(MibStore::seeded(&seed, system_clock()))
}

fn bench_get_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_next");
    for interfaces in [2, 64, 1024] {
        let store = store(interfaces);
        let probe = oids::if_descr().child(interfaces as u32 / 2);
        group.bench_with_input(BenchmarkId::from_parameter(interfaces), &probe, |b, probe| {
            b.iter(|| black_box(store.get_next(black_box(probe))))
        });
    }
    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let store = store(256);

    c.bench_function("walk_if_index_256", |b| {
        b.to_async(&runtime).iter(|| {
            let walk = Walk::new(store.clone(), oids::if_index(), usize::MAX);
            async move { black_box(walk.collect_all().await) }
        })
    });
}

criterion_group!(benches, bench_get_next, bench_walk);
criterion_main!(benches);
