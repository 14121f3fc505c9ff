//! Integration tests for the crossover pipeline.
//!
//! Tests cover:
//! - Hand-computed end-to-end backtest on a short series
//! - One-day lag and per-flip transaction cost
//! - Grid optimization: tie-breaking, empty grids, parallel/sequential parity
//! - Loading prices through a data port
//! - Properties of log-return telescoping, the warm-up trim and benchmark
//!   compounding

mod common;

use approx::assert_relative_eq;
use common::*;
use macross::cli::load_prices;
use macross::domain::backtest::{run_backtest, run_optimization};
use macross::domain::error::MacrossError;
use macross::domain::optimizer::CellOutcome;
use macross::domain::returns::build_returns;
use macross::domain::signal::{SignalFrame, SignalOutcome, WindowPair, generate_signals};
use macross::domain::simulation::{
    BalanceSeries, cagr, count_flips, simulate, simulate_benchmark,
};

const SCENARIO: [f64; 7] = [100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 115.0];

mod end_to_end {
    use super::*;

    #[test]
    fn hand_computed_scenario() {
        let prices = make_prices("2024-01-01", &SCENARIO);
        let mut config = sample_config(range(3, 3, 1), range(2, 2, 1));
        config.start_date = date(2024, 1, 1);
        config.end_date = date(2025, 1, 1);

        let report = run_backtest(&prices, &config, WindowPair::new(3, 2)).unwrap();
        let frame = &report.frame;

        let dates: Vec<_> = (3..=7).map(|d| date(2024, 1, d)).collect();
        assert_eq!(frame.dates, dates);

        let slow = [101.0, 308.0 / 3.0, 316.0 / 3.0, 323.0 / 3.0, 111.0];
        let fast = [101.5, 103.0, 107.5, 109.0, 111.5];
        for t in 0..5 {
            assert_relative_eq!(frame.slow_ma[t], slow[t], epsilon = 1e-9);
            assert_relative_eq!(frame.fast_ma[t], fast[t], epsilon = 1e-9);
        }
        assert_eq!(frame.is_long, vec![true; 5]);

        let realized = [
            0.0,
            (105.0_f64 / 101.0).ln(),
            (110.0_f64 / 105.0).ln(),
            (108.0_f64 / 110.0).ln(),
            (115.0_f64 / 108.0).ln(),
        ];
        let balances = [1.0, 105.0 / 101.0, 110.0 / 101.0, 108.0 / 101.0, 115.0 / 101.0]
            .map(|ratio| 1000.0 * ratio);
        let strategy = report.strategy.balance.values();
        let benchmark = report.benchmark.values();
        for t in 0..5 {
            assert_relative_eq!(report.strategy.realized[t], realized[t], epsilon = 1e-9);
            assert_relative_eq!(strategy[t], balances[t], epsilon = 1e-9);
            assert_relative_eq!(benchmark[t], balances[t], epsilon = 1e-9);
        }
        assert_eq!(report.strategy.balance.points[4].date, date(2024, 1, 7));

        let expected_final = balances[4];
        assert_relative_eq!(
            report.summary.strategy.final_balance,
            expected_final,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            report.summary.benchmark.final_balance,
            expected_final,
            epsilon = 1e-9
        );
        assert_eq!(report.summary.strategy.trades, 0);
        assert_relative_eq!(report.summary.strategy.time_in_market_pct, 100.0);

        let years = 366.0 / 365.25;
        assert_relative_eq!(
            report.summary.strategy.cagr,
            (115.0_f64 / 101.0).powf(1.0 / years) - 1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn optimization_picks_a_backtested_pair() {
        let prices = generate_prices("2020-01-01", 400, 100.0);
        let config = sample_config(range(20, 60, 10), range(5, 15, 5));

        let report = run_optimization(&prices, &config).unwrap();
        assert_eq!(report.backtest.pair, report.optimal.pair);
        assert_relative_eq!(
            report.backtest.summary.strategy.cagr,
            report.optimal.cagr,
            epsilon = 1e-12
        );

        let best = report
            .surface
            .iter()
            .filter_map(|(_, _, c)| c.cagr())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(report.optimal.cagr, best);
    }
}

mod lag_and_costs {
    use super::*;

    fn frame(returns: &[f64], is_long: &[bool]) -> SignalFrame {
        let start = date(2024, 1, 1);
        SignalFrame {
            pair: WindowPair::new(3, 2),
            dates: (0..returns.len())
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            returns: returns.to_vec(),
            slow_ma: vec![1.0; returns.len()],
            fast_ma: vec![1.0; returns.len()],
            is_long: is_long.to_vec(),
        }
    }

    #[test]
    fn position_takes_effect_next_day() {
        let f = frame(&[0.0, 0.01, 0.02, 0.03], &[false, true, true, false]);
        let result = simulate(&f, 1000.0, 0.001);

        assert_eq!(result.realized[0], 0.0);
        assert_relative_eq!(result.realized[1], -0.001, epsilon = 1e-12);
        assert_relative_eq!(result.realized[2], 0.02, epsilon = 1e-12);
        assert_relative_eq!(result.realized[3], 0.03 - 0.001, epsilon = 1e-12);
        assert_eq!(result.trades, 2);
    }

    #[test]
    fn flat_days_earn_nothing() {
        let f = frame(&[0.0, 0.05, -0.05, 0.05], &[false, false, false, false]);
        let result = simulate(&f, 1000.0, 0.001);
        assert!(result.realized.iter().all(|&r| r == 0.0));
        assert_relative_eq!(result.balance.last().unwrap(), 1000.0);
    }

    #[test]
    fn always_long_without_cost_matches_benchmark() {
        let f = frame(&[0.0, 0.01, -0.02, 0.015], &[true; 4]);
        let strategy = simulate(&f, 1000.0, 0.0);
        let benchmark = simulate_benchmark(&f, 1000.0);
        for (s, b) in strategy.balance.values().iter().zip(benchmark.values()) {
            assert_relative_eq!(*s, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn flips_are_counted_once() {
        assert_eq!(count_flips(&[false, true, true, false]), 2);
        assert_eq!(count_flips(&[true, false, true, false, true]), 4);
        assert_eq!(count_flips(&[true]), 0);
        assert_eq!(count_flips(&[]), 0);
    }

    #[test]
    fn doubling_in_one_year() {
        let series = BalanceSeries::compound(
            &[date(2024, 1, 1), date(2025, 1, 1)],
            &[0.0, 2.0_f64.ln()],
            1000.0,
        );
        assert_relative_eq!(cagr(&series, 1.0).unwrap(), 1.0, epsilon = 1e-12);
    }
}

mod optimization {
    use super::*;

    #[test]
    fn ties_resolve_to_first_canonical_cell() {
        let prices = make_prices("2020-01-01", &[50.0; 40]);
        let mut config = sample_config(range(10, 20, 10), range(2, 5, 3));
        config.transaction_cost = 0.0;

        let report = run_optimization(&prices, &config).unwrap();
        assert_eq!(report.optimal.pair, WindowPair::new(10, 2));
        assert_eq!((report.optimal.slow_idx, report.optimal.fast_idx), (0, 0));
        assert_eq!(report.optimal.cagr, 0.0);
    }

    #[test]
    fn grid_without_admissible_pairs_is_empty() {
        let prices = generate_prices("2020-01-01", 50, 100.0);
        let config = sample_config(range(5, 5, 1), range(5, 10, 5));

        let err = run_optimization(&prices, &config).unwrap_err();
        assert!(matches!(
            err,
            MacrossError::EmptyGrid {
                evaluated: 0,
                cells: 2
            }
        ));
    }

    #[test]
    fn oversize_windows_are_recorded_not_raised() {
        let prices = generate_prices("2020-01-01", 30, 100.0);
        let config = sample_config(range(10, 40, 30), range(5, 5, 1));

        let report = run_optimization(&prices, &config).unwrap();
        assert_eq!(report.optimal.pair, WindowPair::new(10, 5));
        assert_eq!(
            report.surface.get_pair(WindowPair::new(40, 5)),
            Some(CellOutcome::Insufficient)
        );
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let prices = generate_prices("2020-01-01", 300, 80.0);
        let mut config = sample_config(range(20, 50, 5), range(3, 18, 3));

        let parallel = run_optimization(&prices, &config).unwrap();
        config.parallel = false;
        let sequential = run_optimization(&prices, &config).unwrap();

        assert_eq!(parallel.surface, sequential.surface);
        assert_eq!(parallel.optimal, sequential.optimal);
    }

    #[test]
    fn inverted_dates_are_rejected_before_sweeping() {
        let prices = generate_prices("2020-01-01", 50, 100.0);
        let mut config = sample_config(range(10, 10, 1), range(5, 5, 1));
        config.end_date = config.start_date;

        assert!(matches!(
            run_optimization(&prices, &config),
            Err(MacrossError::InvalidYears { .. })
        ));
    }
}

mod data_loading {
    use super::*;

    #[test]
    fn prices_come_from_data_port() {
        let port = MockDataPort::new().with_prices("TEST", generate_prices("2020-01-01", 900, 100.0));
        let config = sample_config(range(10, 10, 1), range(5, 5, 1));

        let prices = load_prices(&port, &config).unwrap();
        assert_eq!(prices.first().unwrap().date, date(2020, 1, 1));
        assert_eq!(prices.last().unwrap().date, date(2022, 1, 1));
    }

    #[test]
    fn empty_range_is_data_error() {
        let port = MockDataPort::new().with_prices("TEST", make_prices("2030-01-01", &[1.0, 2.0]));
        let config = sample_config(range(10, 10, 1), range(5, 5, 1));
        assert!(matches!(
            load_prices(&port, &config),
            Err(MacrossError::Data { .. })
        ));
    }

    #[test]
    fn port_errors_propagate() {
        let port = MockDataPort::new().with_error("TEST", "disk on fire");
        let config = sample_config(range(10, 10, 1), range(5, 5, 1));
        let err = load_prices(&port, &config).unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn non_positive_close_is_rejected() {
        let prices = make_prices("2024-01-01", &[10.0, 0.0, 12.0]);
        assert!(matches!(
            build_returns(&prices),
            Err(MacrossError::InvalidPrice { date: d, .. }) if d == date(2024, 1, 2)
        ));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn log_returns_telescope_to_price_ratio(
            closes in prop::collection::vec(0.01f64..10_000.0, 2..120),
        ) {
            let prices = make_prices("2020-01-01", &closes);
            let returns = build_returns(&prices).unwrap();

            prop_assert_eq!(returns.len(), closes.len() - 1);
            let ratio = closes[closes.len() - 1] / closes[0];
            prop_assert!((returns.total().exp() - ratio).abs() <= ratio * 1e-9);
        }

        #[test]
        fn warm_up_trims_slow_minus_one_rows(
            closes in prop::collection::vec(1.0f64..500.0, 2..80),
            slow in 2usize..30,
            fast_seed in 0usize..100,
        ) {
            let fast = 1 + fast_seed % (slow - 1);
            let prices = make_prices("2020-01-01", &closes);
            let returns = build_returns(&prices).unwrap();

            match generate_signals(&prices, &returns, WindowPair::new(slow, fast)) {
                SignalOutcome::Ready(frame) => {
                    prop_assert!(closes.len() >= slow);
                    prop_assert_eq!(frame.len(), closes.len() - slow + 1);
                    prop_assert_eq!(frame.dates[0], prices[slow - 1].date);
                }
                SignalOutcome::Empty => prop_assert!(closes.len() < slow),
            }
        }

        #[test]
        fn benchmark_tracks_price_ratio(
            closes in prop::collection::vec(1.0f64..500.0, 5..60),
        ) {
            let prices = make_prices("2020-01-01", &closes);
            let returns = build_returns(&prices).unwrap();
            let frame = generate_signals(&prices, &returns, WindowPair::new(3, 2))
                .into_frame()
                .unwrap();

            let benchmark = simulate_benchmark(&frame, 1000.0);
            let first_close = closes[2];
            let last_close = closes[closes.len() - 1];
            prop_assert_eq!(benchmark.first().unwrap(), 1000.0);
            let expected = 1000.0 * last_close / first_close;
            prop_assert!((benchmark.last().unwrap() - expected).abs() <= expected * 1e-9);
        }

        #[test]
        fn strategy_starts_at_initial_balance(
            closes in prop::collection::vec(1.0f64..500.0, 5..60),
            cost in 0.0f64..0.01,
        ) {
            let prices = make_prices("2020-01-01", &closes);
            let returns = build_returns(&prices).unwrap();
            let frame = generate_signals(&prices, &returns, WindowPair::new(4, 2))
                .into_frame()
                .unwrap();

            let result = simulate(&frame, 1000.0, cost);
            prop_assert_eq!(result.balance.first().unwrap(), 1000.0);
            prop_assert_eq!(result.trades, count_flips(&frame.is_long));
        }
    }
}
