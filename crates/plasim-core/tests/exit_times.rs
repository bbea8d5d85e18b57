//! End-to-end exit-time scenarios.

use plasim_core::gaps::{Correlation, GapDistribution, GapSource, Theory};
use plasim_core::rng::stream_rng;
use plasim_core::simulation::{ExitTime, ExitTimeSimulator};

fn source(distribution: GapDistribution) -> GapSource {
    GapSource::new(distribution).expect("valid distribution")
}

#[test]
fn uniform_gaps_exit_within_budget() {
    let sim = ExitTimeSimulator::new(
        source(GapDistribution::Uniform { min: 0.0, max: 1.0 }),
        Correlation::None,
    )
    .unwrap()
    .budget(10_000);

    let mut rng = stream_rng(2020, 0);
    let trials = 500;
    let censored = (0..trials)
        .filter(|_| {
            let r = sim.run(5.0, &mut rng).unwrap();
            r.opt_exit_time == Some(ExitTime::Censored)
        })
        .count();
    assert!(censored <= 1, "{censored} of {trials} trajectories censored");
}

#[test]
fn met_exits_no_later_than_opt() {
    for correlation in [Correlation::None, Correlation::MovingAverage { order: 3 }] {
        let sim = ExitTimeSimulator::new(
            source(GapDistribution::Lognormal { mu: 0.0, sigma: 1.0 }),
            correlation,
        )
        .unwrap();

        let mut rng = stream_rng(31, 0);
        for eps in [1.0, 4.0, 16.0] {
            for _ in 0..200 {
                let r = sim.run(eps, &mut rng).unwrap();
                if let Some(ExitTime::Observed(opt)) = r.opt_exit_time {
                    let met = r.met_exit_time.observed();
                    assert!(
                        matches!(met, Some(t) if t <= opt),
                        "{correlation}: opt {opt}, met {met:?} at eps {eps}"
                    );
                }
            }
        }
    }
}

#[test]
fn zero_epsilon_exits_at_second_step() {
    let sim = ExitTimeSimulator::new(
        source(GapDistribution::Exponential { rate: 1.0 }),
        Correlation::None,
    )
    .unwrap();

    let mut rng = stream_rng(7, 0);
    for _ in 0..200 {
        let r = sim.run(0.0, &mut rng).unwrap();
        let opt = r.opt_exit_time.and_then(|t| t.observed()).unwrap();
        assert!(opt <= 3, "OPT exit time {opt}");
        assert_eq!(opt, 2);
    }
}

#[test]
fn moving_average_slope_scales_with_order() {
    let sim = ExitTimeSimulator::new(
        source(GapDistribution::Exponential { rate: 1.0 }),
        Correlation::MovingAverage { order: 4 },
    )
    .unwrap();
    let theory = sim.theory();
    let expected = 1.0 / (theory.mean * 4.0);
    assert!((theory.slope - expected).abs() <= 1e-12 * expected);
    assert!((theory.slope - 0.25).abs() < 1e-12);
    assert!((theory.met_constant - 1.0).abs() < 1e-12);
}

#[test]
fn autoregressive_zero_phi_matches_uncorrelated() {
    let moments = GapDistribution::Lognormal {
        mu: 0.5,
        sigma: 0.8,
    }
    .moments();
    let ar = Theory::new(moments, &Correlation::Autoregressive { phi: 0.0 }).unwrap();
    let iid = Theory::new(moments, &Correlation::None).unwrap();
    assert_eq!(ar.mean, iid.mean);
    assert_eq!(ar.variance, iid.variance);
    assert_eq!(ar.met_constant, iid.met_constant);
    assert_eq!(ar.slope, iid.slope);
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let sim = ExitTimeSimulator::new(
        source(GapDistribution::Gamma {
            shape: 2.0,
            scale: 1.5,
        }),
        Correlation::MovingAverage { order: 2 },
    )
    .unwrap();
    for index in 0..20 {
        let a = sim.run(6.0, &mut stream_rng(99, index)).unwrap();
        let b = sim.run(6.0, &mut stream_rng(99, index)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn met_only_agrees_with_full_run() {
    let gaps = source(GapDistribution::Uniform { min: 0.0, max: 2.0 });
    let full = ExitTimeSimulator::new(gaps.clone(), Correlation::None).unwrap();
    let met_only = ExitTimeSimulator::new(gaps, Correlation::None)
        .unwrap()
        .met_only(true);

    let mut compared = 0;
    for index in 0..200 {
        let a = full.run(4.0, &mut stream_rng(5, index)).unwrap();
        let b = met_only.run(4.0, &mut stream_rng(5, index)).unwrap();
        // A full run stops at the OPT break, so MET may be unobserved there.
        if let ExitTime::Observed(t) = a.met_exit_time {
            assert_eq!(b.met_exit_time, ExitTime::Observed(t));
            compared += 1;
        }
    }
    assert!(compared > 0);
}

#[test]
fn negative_phi_reports_precondition_or_exits() {
    // Strongly negative correlation can make increments non-positive; that
    // aborts the trajectory instead of corrupting the region.
    let sim = ExitTimeSimulator::new(
        source(GapDistribution::Uniform { min: 0.0, max: 1.0 }),
        Correlation::Autoregressive { phi: -0.95 },
    )
    .unwrap()
    .budget(100_000);
    let mut rng = stream_rng(3, 0);
    let mut violations = 0;
    for _ in 0..50 {
        match sim.run(50.0, &mut rng) {
            Ok(r) => assert!(r.opt_exit_time.is_some()),
            Err(e) => {
                assert!(e.is_precondition_violation());
                violations += 1;
            }
        }
    }
    assert!(violations > 0);
}
