//! Benchmarks for indicator implementations.

use backtest_core::traits::{Indicator, MultiOutputIndicator, OhlcvIndicator};
use backtest_core::types::{Bar, PriceSeries, Timeframe};
use backtest_indicators::{Ema, IndicatorEngine, Kdj, Macd, Sma};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("moving_average");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_momentum(c: &mut Criterion) {
    let mut group = c.benchmark_group("momentum");

    for size in [1000, 10000, 100000].iter() {
        let close = generate_test_data(*size);
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();

        group.bench_with_input(BenchmarkId::new("macd", size), &close, |b, data| {
            let macd = Macd::new();
            b.iter(|| macd.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("kdj", size), &close, |b, data| {
            let kdj = Kdj::new();
            b.iter(|| kdj.calculate(black_box(&high), black_box(&low), black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_engine(c: &mut Criterion) {
    let bars: Vec<Bar> = generate_test_data(10000)
        .into_iter()
        .enumerate()
        .map(|(i, close)| Bar::new(i as i64 * 86_400_000, close, close + 1.0, close - 1.0, close, 1.0))
        .collect();
    let series = match PriceSeries::new("BENCH", Timeframe::Daily, bars) {
        Ok(series) => series,
        Err(e) => panic!("benchmark series is invalid: {}", e),
    };

    c.bench_function("engine_kdj_macd", |b| {
        b.iter(|| {
            let mut engine = IndicatorEngine::new(black_box(&series));
            let macd = engine.macd(12, 26, 9);
            let kdj = engine.kdj(9, 3, 3);
            (macd.is_ok(), kdj.is_ok())
        })
    });
}

criterion_group!(
    benches,
    benchmark_moving_averages,
    benchmark_momentum,
    benchmark_engine
);
criterion_main!(benches);
