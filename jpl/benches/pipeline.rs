use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

use jpl::{dict::HashDict, prelude::*};

fn criterion_benchmark(c: &mut Criterion) {
    {
        let source = include_str!("../tests/sample.jpl");

        c.bench_function("sample lex", |b| {
            b.iter(|| black_box(run(black_box(source), Stage::Lex)))
        });
        c.bench_function("sample type check", |b| {
            b.iter(|| black_box(run(black_box(source), Stage::TypeCheck)))
        });
    }

    {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let keys: Vec<String> = (0..1000)
            .map(|_| {
                let len = rng.gen_range(1..16);
                (&mut rng).sample_iter(&Alphanumeric).take(len).map(char::from).collect()
            })
            .collect();

        c.bench_function("dict insert 1000", |b| {
            b.iter(|| {
                let mut dict = HashDict::new();
                for (i, key) in keys.iter().enumerate() {
                    dict.insert_or_replace(key.as_str(), i);
                }
                black_box(dict.len())
            })
        });

        let mut dict = HashDict::new();
        for (i, key) in keys.iter().enumerate() {
            dict.insert_or_replace(key.as_str(), i);
        }
        c.bench_function("dict lookup 1000", |b| {
            b.iter(|| {
                keys.iter()
                    .filter_map(|key| dict.try_get(key.as_str()))
                    .sum::<usize>()
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
