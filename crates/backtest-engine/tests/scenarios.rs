//! End-to-end runs of the bundled strategies.

use backtest_core::types::{Bar, OrderStatus, PriceSeries, Side, Timeframe};
use backtest_engine::{BacktestConfig, BacktestEngine};
use backtest_indicators::IndicatorEngine;
use backtest_sizing::PositionSizingMethod;
use backtest_strategies::{HaramiStrategy, KdjMacdStrategy, SmaCrossStrategy};
use rust_decimal_macros::dec;

// 2020-01-01T00:00:00Z
const START: i64 = 1_577_836_800_000;
const DAY: i64 = 86_400_000;

fn ohlc_series(bars: &[(f64, f64, f64, f64)]) -> PriceSeries {
    let bars = bars
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(START + i as i64 * DAY, open, high, low, close, 1000.0)
        })
        .collect();
    PriceSeries::new("TEST", Timeframe::Daily, bars).unwrap()
}

fn flat_bars(prices: &[f64]) -> PriceSeries {
    let bars: Vec<_> = prices.iter().map(|&p| (p, p + 1.0, p - 1.0, p)).collect();
    ohlc_series(&bars)
}

fn wave_series(len: usize) -> PriceSeries {
    let bars: Vec<_> = (0..len)
        .map(|i| {
            let close = 100.0 + 10.0 * (i as f64 / 7.0).sin() + i as f64 * 0.05;
            (close - 0.5, close + 1.0, close - 1.0, close)
        })
        .collect();
    ohlc_series(&bars)
}

#[test]
fn sma_buys_one_lot_after_breakout() {
    let mut prices = vec![100.0; 30];
    prices.extend([120.0; 10]);
    let series = flat_bars(&prices);

    let engine = BacktestEngine::new(BacktestConfig::default());
    let mut strategy = SmaCrossStrategy::default();
    let report = engine.run(&series, &mut strategy).unwrap();

    let lines = report.journal_lines();
    assert_eq!(
        lines,
        vec![
            "2020-01-31, BUY CREATE, 120.00",
            "2020-02-01, BUY EXECUTED, Price: 120.00, Cost: 12000.00, Comm 24.00",
            "2020-02-09, Ending Value 999976.00",
        ]
    );

    assert_eq!(report.final_cash, dec!(987976));
    assert_eq!(report.final_position.size, dec!(100));
    assert_eq!(report.stats.final_value, dec!(999976));
    assert_eq!(report.stats.total_commission, dec!(24));
    let last = report.stats.equity_curve.last().unwrap();
    assert_eq!(last.unrealized_pnl, dec!(0));
    assert_eq!(report.stats.total_trades, 0);
    assert_eq!(report.trades.len(), 1);
    assert!(!report.trades[0].closed);
}

#[test]
fn harami_round_trip() {
    let series = ohlc_series(&[
        (10.0, 11.0, 8.0, 9.0),
        // Inside the bearish body of the bar before
        (9.25, 9.75, 9.125, 9.5),
        (9.5, 10.0, 9.25, 9.75),
        (9.75, 10.25, 9.5, 10.0),
        // (11 - 9.75) / 11 > 0.1
        (10.5, 11.25, 10.25, 11.0),
        (11.5, 12.0, 11.0, 11.75),
    ]);

    let config = BacktestConfig {
        initial_cash: dec!(7000),
        commission_rate: dec!(0.003),
        sizing: PositionSizingMethod::Fixed { shares: dec!(1) },
        ..Default::default()
    };
    let engine = BacktestEngine::new(config);
    let mut strategy = HaramiStrategy::default();
    let report = engine.run(&series, &mut strategy).unwrap();

    assert_eq!(
        report.journal_lines(),
        vec![
            "2020-01-02, BUY CREATE, 9.50",
            "2020-01-03, BUY EXECUTED, Price: 9.50, Cost: 9.50, Comm 0.03",
            "2020-01-05, SELL CREATE, 11.00",
            "2020-01-06, SELL EXECUTED, Price: 11.50, Cost: 11.50, Comm 0.03",
            "2020-01-06, OPERATION PROFIT, GROSS 2.00, NET 1.94",
            "2020-01-06, Ending Value 7001.94",
        ]
    );

    assert_eq!(report.final_cash, dec!(7001.937));
    assert!(report.final_position.is_flat());
    assert_eq!(report.stats.total_trades, 1);
    assert_eq!(report.stats.winning_trades, 1);

    let rate = report.stats.mean_profit_rate.unwrap();
    assert!((rate - 2.0 / 9.5).abs() < 1e-9);
    assert_eq!(strategy.profit_rates().len(), 1);
    assert!((strategy.profit_rates()[0] - rate).abs() < 1e-9);
}

#[test]
fn kdj_macd_orders_follow_indicator_rules() {
    let series = wave_series(250);
    let config = BacktestConfig {
        initial_cash: dec!(10000),
        commission_rate: dec!(0.005),
        ..Default::default()
    };
    let engine = BacktestEngine::new(config);
    let mut strategy = KdjMacdStrategy::default();
    let report = engine.run(&series, &mut strategy).unwrap();

    let mut indicators = IndicatorEngine::new(&series);
    let macd = indicators.macd(12, 26, 9).unwrap();
    let kdj = indicators.kdj(9, 3, 3).unwrap();
    let spread = |a: &[f64], b: &[f64], i: usize| a[i] - b[i];

    let completed: Vec<_> = report
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .collect();
    assert!(completed.len() >= 2);

    for (n, order) in completed.iter().enumerate() {
        let i = order.requested_bar_index;
        let expected_side = if n % 2 == 0 { Side::Buy } else { Side::Sell };
        assert_eq!(order.side, expected_side, "order {}", n);

        match order.side {
            Side::Buy => {
                let (m, s) = (macd.macd.values(), macd.signal.values());
                assert!(spread(m, s, i - 1) < 0.0 && spread(m, s, i) > 0.0);
            }
            Side::Sell => {
                let (j, d) = (kdj.j.values(), kdj.d.values());
                assert!(spread(j, d, i - 1) > 0.0 || spread(j, d, i) < 0.0);
            }
        }
        // Market orders fill on the next bar's open
        let execution = order.executed.as_ref().unwrap();
        assert_eq!(execution.bar_index, i + 1);
    }
}

#[test]
fn replay_is_deterministic() {
    let series = wave_series(300);
    let engine = BacktestEngine::new(BacktestConfig::default());
    let mut strategy = KdjMacdStrategy::default();

    let first = engine.run(&series, &mut strategy).unwrap();
    let second = engine.run(&series, &mut strategy).unwrap();

    assert_eq!(first.journal, second.journal);
    assert_eq!(first.orders, second.orders);
    assert_eq!(first.trades, second.trades);
    assert_eq!(first.final_cash, second.final_cash);
    assert_eq!(first.stats.equity_curve, second.stats.equity_curve);
    assert_eq!(first.strategy, second.strategy);
}

#[test]
fn later_bars_do_not_change_earlier_decisions() {
    let full = wave_series(200);
    let cut = 120;
    let truncated = PriceSeries::new("TEST", Timeframe::Daily, full.bars()[..cut].to_vec()).unwrap();

    // Same prefix, very different future
    let mut altered: Vec<Bar> = full.bars().to_vec();
    for bar in altered.iter_mut().skip(cut) {
        bar.open *= 3.0;
        bar.high *= 3.0;
        bar.low *= 3.0;
        bar.close *= 3.0;
    }
    let altered = PriceSeries::new("TEST", Timeframe::Daily, altered).unwrap();

    let engine = BacktestEngine::new(BacktestConfig::default());
    let run = |series: &PriceSeries| {
        let mut strategy = KdjMacdStrategy::default();
        engine
            .run(series, &mut strategy)
            .unwrap()
            .journal
            .into_iter()
            .filter(|e| e.bar_index < cut - 1)
            .collect::<Vec<_>>()
    };

    let reference = run(&truncated);
    assert!(!reference.is_empty());
    assert_eq!(run(&full), reference);
    assert_eq!(run(&altered), reference);
}
