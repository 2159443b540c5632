use criterion::{black_box, criterion_group, criterion_main, Criterion};

use earlyedge_core::model::{Attempt, Classification, Response, Stimulus};
use earlyedge_core::statistics::{speed_category, summarize, weighted_vote, RiskPolicy};

fn make_votes(n: usize) -> Vec<Classification> {
    (0..n)
        .map(|i| {
            let label = match i % 3 {
                0 => "Minimal",
                1 => "Emerging",
                _ => "Strong",
            };
            Classification::new(label, (i % 10) as f64 / 10.0)
        })
        .collect()
}

fn make_attempts(n: usize) -> Vec<Attempt> {
    (0..n)
        .map(|i| Attempt {
            ordinal: i,
            round: i / 5 + 1,
            stimulus: Stimulus::PhonoSpeech {
                question: format!("question {i}"),
            },
            response: Response::Transcript("answer".into()),
            is_correct: Some(i % 2 == 0),
            response_time_secs: 0.5 + (i % 7) as f64,
            classification: Some(Classification::new("Emerging", 0.5)),
        })
        .collect()
}

fn bench_weighted_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_vote");

    for n in [3usize, 100, 10_000] {
        let votes = make_votes(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| weighted_vote(black_box(&votes)))
        });
    }

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for n in [5usize, 52, 1000] {
        let attempts = make_attempts(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| {
                summarize(
                    black_box(&attempts),
                    black_box(&RiskPolicy::WeightedVote),
                    None,
                )
            })
        });
    }

    group.bench_function("speed_category_1000", |b| {
        let times: Vec<f64> = (0..1000).map(|i| (i % 8) as f64).collect();
        b.iter(|| speed_category(black_box(&times)))
    });

    group.finish();
}

criterion_group!(benches, bench_weighted_vote, bench_summarize);
criterion_main!(benches);
