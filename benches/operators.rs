use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use weasel_swarm::genome::{
    fitness, mutate, random_population, rank, Alphabet, Candidate, CrossoverStrategy,
    FitnessEvaluator,
};
use weasel_swarm::swarm::DEFAULT_TARGET;

fn bench_operators(c: &mut Criterion) {
    let alphabet = Alphabet::default();
    let target = Candidate::from(DEFAULT_TARGET);
    let mut rng = StdRng::seed_from_u64(7);
    let a = alphabet.random_candidate(target.len(), &mut rng);
    let b = alphabet.random_candidate(target.len(), &mut rng);

    c.bench_function("fitness_28", |bench| {
        bench.iter(|| fitness(&a, &target))
    });

    for strategy in [
        CrossoverStrategy::Uniform,
        CrossoverStrategy::OnePoint,
        CrossoverStrategy::LocalFitness,
    ] {
        c.bench_function(&format!("crossover_{}_28", strategy), |bench| {
            bench.iter(|| strategy.apply(&a, &b, &target, &mut rng))
        });
    }

    c.bench_function("mutate_28_rate_0.05", |bench| {
        bench.iter(|| mutate(&a, 0.05, &alphabet, &mut rng))
    });

    let evaluator = FitnessEvaluator::new(target.clone());
    let population = random_population(100, target.len(), &alphabet, &mut rng);
    c.bench_function("rank_100x28", |bench| {
        bench.iter(|| rank(&population, &evaluator))
    });
}

criterion_group!(benches, bench_operators);
criterion_main!(benches);
