use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lockset::SafeSet;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_add_10k(c: &mut Criterion) {
    c.bench_function("safe::add_10k", |b| {
        b.iter_batched(
            SafeSet::<String>::new,
            |s| {
                for x in lcg(1).take(10_000) {
                    s.add(key(x));
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_contains_hit(c: &mut Criterion) {
    c.bench_function("safe::contains_hit", |b| {
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        let s: SafeSet<String> = keys.iter().cloned().collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(s.contains(k.as_str()));
        })
    });
}

fn bench_contains_4_readers(c: &mut Criterion) {
    c.bench_function("safe::contains_4_readers", |b| {
        let s: SafeSet<u64> = (0..10_000).collect();
        b.iter(|| {
            crossbeam_utils::thread::scope(|scope| {
                for t in 0..4u64 {
                    let s = &s;
                    scope.spawn(move |_| {
                        for i in 0..1_000 {
                            black_box(s.contains(&(t * 1_000 + i)));
                        }
                    });
                }
            })
            .unwrap();
        })
    });
}

fn bench_union_10k(c: &mut Criterion) {
    let a: SafeSet<u64> = lcg(3).take(10_000).map(|x| x % 20_000).collect();
    let b: SafeSet<u64> = lcg(5).take(10_000).map(|x| x % 20_000).collect();
    c.bench_function("safe::union_10k", |bench| {
        bench.iter(|| black_box(a.union(&b)))
    });
}

fn bench_iterator_drain_10k(c: &mut Criterion) {
    let s: SafeSet<u64> = (0..10_000).collect();
    c.bench_function("safe::iterator_drain_10k", |b| {
        b.iter(|| black_box(s.iterator().count()))
    });
    c.bench_function("safe::iterator_drain_10k_buffered_64", |b| {
        b.iter(|| black_box(s.iterator_with_capacity(64).count()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_add_10k, bench_contains_hit, bench_contains_4_readers, bench_union_10k, bench_iterator_drain_10k
}
criterion_main!(benches);
