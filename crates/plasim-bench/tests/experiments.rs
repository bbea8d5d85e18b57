//! End-to-end runs of the Monte Carlo experiments.

use plasim_bench::config::{ExperimentConfig, GrowthConfig};
use plasim_bench::control::Control;
use plasim_bench::exit_times::{ExitTimeExperiment, CSV_HEADER, MET_ONLY_CSV_HEADER};
use plasim_bench::growth::GrowthExperiment;
use plasim_bench::harness::MonteCarlo;
use plasim_bench::output::{write_report, CsvReport, Preamble};
use plasim_core::{Algorithm, Correlation, GapDistribution, GapSource};
use std::sync::Mutex;

fn uniform() -> GapSource {
    GapSource::new(GapDistribution::Uniform { min: 0.0, max: 1.0 }).unwrap()
}

#[test]
fn exit_time_run_fills_every_bucket() {
    let config = ExperimentConfig::new()
        .epsilon_range(1, 8)
        .iterations(4_000)
        .threads(4)
        .seed(1);
    let experiment = ExitTimeExperiment::new(uniform(), config.clone()).unwrap();
    let outcome = MonteCarlo::new(experiment, config.run).run(|_| {}).unwrap();
    assert!(!outcome.is_interrupted());

    let summary = outcome.into_summary();
    assert_eq!(summary.completed, 4_000);
    let table = summary.aggregate;
    assert_eq!(table.total_samples(), 4_000);
    for eps in 1..=8 {
        let bucket = table.bucket(eps).unwrap();
        assert!(bucket.samples > 0, "ε = {eps} never drawn");
        assert!(bucket.opt.mean() >= 2.0);
        assert!(bucket.opt_lo.mean() <= bucket.opt_hi.mean());
    }
    // Larger error bounds keep a line longer.
    assert!(table.bucket(8).unwrap().opt.mean() > table.bucket(1).unwrap().opt.mean());

    let csv = table.to_csv();
    assert!(csv.starts_with(CSV_HEADER));
    assert_eq!(csv.lines().count(), 9);
}

#[test]
fn rejected_trajectories_are_reported() {
    // Small-shape gamma gaps underflow, so many trajectories are rejected.
    let gaps = GapSource::new(GapDistribution::Gamma {
        shape: 0.05,
        scale: 1.0,
    })
    .unwrap();
    let config = ExperimentConfig::new()
        .epsilon_range(8, 8)
        .iterations(2_000)
        .threads(1)
        .seed(1);
    let experiment = ExitTimeExperiment::new(gaps, config.clone()).unwrap();
    let summary = MonteCarlo::new(experiment, config.run)
        .run(|_| {})
        .unwrap()
        .into_summary();
    assert!(summary.rejected > 0);
    assert!(summary.aggregate.total_samples() + summary.rejected <= summary.completed);

    let mut out = Vec::new();
    write_report(
        &mut out,
        &Preamble::default(),
        &summary.aggregate,
        summary.totals(),
        false,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    let first = text.lines().next().unwrap();
    assert_eq!(first, format!("# rejected {} of 2000", summary.rejected));
    assert_eq!(text.lines().nth(1), Some(CSV_HEADER));
}

#[test]
fn interrupted_checkpoint_renders_as_json() {
    let config = ExperimentConfig::new()
        .epsilon_range(1, 4)
        .iterations(1_000_000)
        .threads(2)
        .seed(9)
        .checkpoint_every(100);
    let experiment = ExitTimeExperiment::new(uniform(), config.clone()).unwrap();
    let preamble = experiment.preamble();
    let control = Control::new();
    let runner = MonteCarlo::new(experiment, config.run).with_control(control.clone());
    let outcome = runner
        .run(|p| {
            if p.completed >= 1_000 {
                control.request_interrupt();
            }
        })
        .unwrap();
    assert!(outcome.is_interrupted());

    let snapshot = runner.checkpoints().latest().unwrap();
    let mut out = Vec::new();
    write_report(
        &mut out,
        &preamble,
        &snapshot.aggregate,
        snapshot.totals(),
        true,
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["trials"]["completed"], snapshot.completed);
    assert_eq!(value["rows"].as_array().unwrap().len(), 4);
}

#[test]
fn checkpoints_never_exceed_final_counts() {
    let config = ExperimentConfig::new()
        .epsilon_range(2, 6)
        .iterations(3_000)
        .threads(3)
        .seed(5)
        .checkpoint_every(250);
    let experiment = ExitTimeExperiment::new(uniform(), config.clone()).unwrap();
    let runner = MonteCarlo::new(experiment, config.run);

    let seen = Mutex::new(Vec::new());
    let outcome = runner
        .run(|p| {
            if p.completed % 500 == 0 {
                if let Some(snapshot) = runner.checkpoints().latest() {
                    seen.lock().unwrap().push(snapshot);
                }
            }
        })
        .unwrap();
    let final_table = outcome.into_summary().aggregate;
    let seen = seen.into_inner().unwrap();
    assert!(!seen.is_empty());

    for snapshot in &seen {
        assert_eq!(snapshot.completed % 250, 0);
        for (partial, total) in snapshot
            .aggregate
            .buckets()
            .iter()
            .zip(final_table.buckets())
        {
            assert!(partial.samples <= total.samples);
            assert!(partial.opt.samples() <= total.opt.samples());
            assert!(partial.met.samples() <= total.met.samples());
        }
        assert_eq!(snapshot.rendered, snapshot.aggregate.to_csv());
    }
}

#[test]
fn met_only_run_reports_met_columns() {
    let config = ExperimentConfig::new()
        .epsilon_range(4, 8)
        .step(2)
        .met_only(true)
        .correlation(Correlation::MovingAverage { order: 3 })
        .iterations(2_000)
        .threads(2)
        .seed(3);
    let experiment = ExitTimeExperiment::new(
        GapSource::new(GapDistribution::Exponential { rate: 2.0 }).unwrap(),
        config.clone(),
    )
    .unwrap();
    assert!((experiment.simulator().theory().slope - 2.0 / 3.0).abs() < 1e-12);

    let table = MonteCarlo::new(experiment, config.run)
        .run(|_| {})
        .unwrap()
        .into_summary()
        .aggregate;
    let csv = table.to_csv();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(MET_ONLY_CSV_HEADER));
    let epsilons: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(epsilons, vec!["4", "6", "8"]);
    // With step 2 only even offsets are drawn.
    assert_eq!(table.bucket(5).unwrap().samples, 0);
    assert!(table.bucket(6).unwrap().met.mean() > 0.0);
}

#[test]
fn interrupted_run_keeps_partial_results() {
    let config = ExperimentConfig::new()
        .iterations(10_000_000)
        .threads(2)
        .seed(11)
        .checkpoint_every(100);
    let experiment = ExitTimeExperiment::new(uniform(), config.clone()).unwrap();
    let control = Control::new();
    let runner = MonteCarlo::new(experiment, config.run).with_control(control.clone());
    let outcome = runner
        .run(|p| {
            if p.completed >= 500 {
                control.request_interrupt();
            }
        })
        .unwrap();
    assert!(outcome.is_interrupted());
    assert!(runner.checkpoints().completed() >= 500);
    assert!(runner.checkpoints().completed() <= outcome.summary().completed);
}

#[test]
fn growth_run_counts_are_monotone() {
    for algorithm in [Algorithm::Met, Algorithm::Opt] {
        let config = GrowthConfig::new(2_000)
            .step(100)
            .epsilon(4)
            .algorithm(algorithm)
            .iterations(200)
            .threads(2)
            .seed(8);
        let experiment = GrowthExperiment::new(uniform(), config.clone()).unwrap();
        let table = MonteCarlo::new(experiment, config.run)
            .run(|_| {})
            .unwrap()
            .into_summary()
            .aggregate;
        let rows = table.rows();
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0].n, 1);
        assert_eq!(rows[0].segments_avg, 1.0);
        assert_eq!(rows[20].n, 2_000);
        assert!(rows.windows(2).all(|w| w[0].segments_avg <= w[1].segments_avg));
        assert!(rows[20].segments_avg > 1.0);
    }
}

#[test]
fn invalid_correlation_fails_before_running() {
    let config = ExperimentConfig::new().correlation(Correlation::Autoregressive { phi: 1.2 });
    assert!(ExitTimeExperiment::new(uniform(), config).is_err());
}
