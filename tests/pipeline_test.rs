//! End-to-end: INI config and CSV bars on disk through the adapters.

mod common;

use common::*;
use laddertrader::adapters::csv_adapter::CsvAdapter;
use laddertrader::adapters::file_config_adapter::FileConfigAdapter;
use laddertrader::domain::backtest::{run_dca, run_sweep, run_trend};
use laddertrader::domain::config::{BarInterval, dca_config_from_port, trend_config_from_port};
use laddertrader::domain::engine::SkipReason;
use laddertrader::domain::error::{DataError, LadderError};
use laddertrader::domain::sweep::{SweepSummary, buy_time_grid};
use laddertrader::ports::data_port::DataPort;
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[dca]
initial_capital = 20000
daily_investment = 2000
buy_time = 10:00
price_increment = 1.0
interval = 5m
use_filter = true
filter_period = 3
start_date = 2025-01-06

[trend]
initial_capital = 10000
commission_rate = 0
slippage_pct = 0
"#;

/// Three days of five-minute TQQQ bars: buy at 70 on the 10:00 bar, then a
/// 15:55 spike to 72.
fn tqqq_csv() -> String {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for day in ["2025-01-06", "2025-01-07", "2025-01-08"] {
        writeln!(csv, "{} 09:55:00,70,70,70,70,1000", day).unwrap();
        writeln!(csv, "{} 10:00:00,70,70,70,70,1000", day).unwrap();
        writeln!(csv, "{} 15:55:00,70,72,70,71,1000", day).unwrap();
    }
    csv
}

/// Rising daily QQQ closes from 2025-01-01, so the filter stays bullish.
fn qqq_csv() -> String {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for (i, day) in ["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-06", "2025-01-07"]
        .iter()
        .enumerate()
    {
        let close = 500.0 + i as f64;
        writeln!(csv, "{},{},{},{},{},5000", day, close, close, close, close).unwrap();
    }
    csv
}

fn setup() -> (TempDir, CsvAdapter, FileConfigAdapter) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("TQQQ.csv"), tqqq_csv()).unwrap();
    fs::write(dir.path().join("QQQ.csv"), qqq_csv()).unwrap();
    let config_path = dir.path().join("laddertrader.ini");
    fs::write(&config_path, CONFIG).unwrap();
    let config = FileConfigAdapter::from_file(&config_path).unwrap();
    let data = CsvAdapter::new(dir.path());
    (dir, data, config)
}

mod dca_pipeline {
    use super::*;

    #[test]
    fn config_file_drives_the_run() {
        let (_dir, data, config) = setup();
        let dca = dca_config_from_port(&config).unwrap();
        assert_eq!(dca.interval, BarInterval::FiveMinute);
        assert_eq!(dca.filter_period, 3);
        assert_eq!(dca.start_date, Some(date(2025, 1, 6)));

        let report = run_dca(&data, &dca, "TQQQ", "QQQ").unwrap();

        assert_eq!(report.metrics.buys, 3);
        assert!(report.outcome.skips.is_empty());
        // Each day's 71 and 72 rungs fill on the 15:55 spike.
        assert_eq!(report.metrics.sells, 6);
        // 28 shares a day, 2 + 2 sold a day.
        assert_eq!(report.outcome.snapshot.final_shares, 3 * 24);
        assert_eq!(report.metrics.pending.count, 3 * 8);
        assert!((report.metrics.total_realized - 3.0 * 6.0).abs() < 1e-9);
        assert_eq!(report.outcome.portfolio.equity_curve.len(), 3);
        assert!(report.outcome.portfolio.cash >= 0.0);
    }

    #[test]
    fn bearish_filter_file_blocks_buys() {
        let (dir, data, config) = setup();
        let mut csv = String::from("timestamp,open,high,low,close,volume\n");
        for (i, day) in ["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-06", "2025-01-07"]
            .iter()
            .enumerate()
        {
            let close = 500.0 - i as f64;
            writeln!(csv, "{},{},{},{},{},5000", day, close, close, close, close).unwrap();
        }
        fs::write(dir.path().join("QQQ.csv"), csv).unwrap();

        let dca = dca_config_from_port(&config).unwrap();
        let report = run_dca(&data, &dca, "TQQQ", "QQQ").unwrap();
        assert_eq!(report.metrics.buys, 0);
        assert_eq!(report.outcome.skip_count(SkipReason::FilterBearish), 3);
    }

    #[test]
    fn sweep_over_the_grid() {
        let (_dir, data, config) = setup();
        let dca = dca_config_from_port(&config).unwrap();
        let results = run_sweep(&data, &dca, "TQQQ", "QQQ", &buy_time_grid()).unwrap();
        assert_eq!(results.len(), 13);
        // Only 10:00 has a bar to buy on.
        assert_eq!(results[0].buy_time.to_string(), "10:00:00");
        assert_eq!(results[0].metrics.buys, 3);
        let summary = SweepSummary::from_ranked(&results).unwrap();
        assert_eq!(summary.best, results[0].buy_time);
    }
}

mod trend_pipeline {
    use super::*;

    #[test]
    fn trend_section_runs_on_csv_bars() {
        let (_dir, data, config) = setup();
        let trend = trend_config_from_port(&config).unwrap();
        assert!((trend.execution.commission_rate - 0.0).abs() < f64::EPSILON);
        let report = run_trend(&data, &trend, "TQQQ").unwrap();
        assert_eq!(report.outcome.outcome.bars_processed, 9);
        assert_eq!(
            report.outcome.signals.first().map(|s| s.timestamp),
            Some(at(date(2025, 1, 6), 9, 55))
        );
    }
}

mod failures {
    use super::*;

    #[test]
    fn missing_section_is_a_config_error() {
        let config = FileConfigAdapter::from_string("[trend]\nadx_length = 9\n").unwrap();
        match dca_config_from_port(&config) {
            Err(LadderError::ConfigSectionMissing { section }) => assert_eq!(section, "dca"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn bad_value_names_the_key() {
        let config = FileConfigAdapter::from_string("[dca]\nbuy_time = noon\n").unwrap();
        match dca_config_from_port(&config) {
            Err(LadderError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "dca");
                assert_eq!(key, "buy_time");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn out_of_order_csv_is_rejected() {
        let (dir, data, config) = setup();
        fs::write(
            dir.path().join("TQQQ.csv"),
            "timestamp,open,high,low,close,volume\n\
             2025-01-07 10:00:00,70,70,70,70,1000\n\
             2025-01-06 10:00:00,70,70,70,70,1000\n",
        )
        .unwrap();
        let dca = dca_config_from_port(&config).unwrap();
        let err = run_dca(&data, &dca, "TQQQ", "QQQ").unwrap_err();
        assert!(matches!(err, LadderError::Data(DataError::OutOfOrder { .. })));
    }

    #[test]
    fn high_below_low_is_rejected() {
        let (dir, data, config) = setup();
        fs::write(
            dir.path().join("TQQQ.csv"),
            "timestamp,open,high,low,close,volume\n2025-01-06 10:00:00,70,69,71,70,1000\n",
        )
        .unwrap();
        let dca = dca_config_from_port(&config).unwrap();
        let err = run_dca(&data, &dca, "TQQQ", "QQQ").unwrap_err();
        assert!(matches!(err, LadderError::Data(_)));
    }

    #[test]
    fn mock_port_errors_propagate() {
        let port = MockDataPort::new().with_error("TQQQ", "feed offline");
        let dca = laddertrader::domain::config::DcaConfig {
            use_filter: false,
            ..ladder_config(20_000.0, 2_000.0)
        };
        let err = run_dca(&port, &dca, "TQQQ", "QQQ").unwrap_err();
        assert!(matches!(err, LadderError::DataSource { reason } if reason == "feed offline"));
        assert!(port.list_tickers().unwrap().is_empty());
    }
}
