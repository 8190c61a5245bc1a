//! Inverse motor solve scenarios: determinism, load sweeps, temperature.

use pt_motor::{MotorCircuitModel, MotorError, MotorSolveConfig, MotorSpec, QuadraticSaturation};

fn reference_motor() -> MotorSpec {
    MotorSpec::new("kv1000", 1000.0, 0.020, 2.0, 10_000.0, 50.0, 800.0).unwrap()
}

#[test]
fn repeated_solves_are_identical() {
    let model = MotorCircuitModel::default();
    let motor = reference_motor();
    let config = MotorSolveConfig::default();

    let first = model.solve_operating_point(&motor, 14.8, 0.30, 25.0, &config).unwrap();
    for _ in 0..10 {
        let again = model.solve_operating_point(&motor, 14.8, 0.30, 25.0, &config).unwrap();
        assert_eq!(first, again);
    }

    // Converged RPM is within the solver tolerance of the analytic root
    assert!((first.rpm - 14_124.0).abs() < 2.0 * config.rpm_tolerance);
    assert!((first.current_a - 33.80).abs() < 0.05);
    assert!(first.efficiency > 0.85 && first.efficiency < 0.9);
}

#[test]
fn heavier_load_means_lower_speed_and_more_current() {
    let model = MotorCircuitModel::default();
    let motor = reference_motor();
    let config = MotorSolveConfig::default();

    let mut last_rpm = f64::INFINITY;
    let mut last_current = f64::NEG_INFINITY;
    for load in [0.05, 0.10, 0.20, 0.30, 0.40] {
        let p = model.solve_operating_point(&motor, 14.8, load, 25.0, &config).unwrap();
        assert!(p.rpm < last_rpm);
        assert!(p.current_a > last_current);
        last_rpm = p.rpm;
        last_current = p.current_a;
    }
}

#[test]
fn hot_windings_slow_the_motor() {
    let model = MotorCircuitModel::default();
    let motor = reference_motor();
    let config = MotorSolveConfig::default();

    let cold = model.solve_operating_point(&motor, 14.8, 0.30, 25.0, &config).unwrap();
    let hot = model.solve_operating_point(&motor, 14.8, 0.30, 100.0, &config).unwrap();
    assert!(hot.rpm < cold.rpm);
    assert!(hot.copper_loss_w > cold.copper_loss_w);
    assert!(hot.efficiency < cold.efficiency);
}

#[test]
fn saturation_needs_more_current_for_same_load() {
    let motor = reference_motor();
    let config = MotorSolveConfig::default();
    let linear = MotorCircuitModel::default();
    let saturated = MotorCircuitModel::new(QuadraticSaturation::new(0.05).unwrap());

    let a = linear.solve_operating_point(&motor, 14.8, 0.30, 25.0, &config).unwrap();
    let b = saturated.solve_operating_point(&motor, 14.8, 0.30, 25.0, &config).unwrap();
    assert!(b.current_a > a.current_a);
    assert!((b.torque_nm - 0.30).abs() < 2e-3);
}

#[test]
fn negative_load_is_invalid_input() {
    let model = MotorCircuitModel::default();
    let err = model
        .solve_operating_point(&reference_motor(), 14.8, -0.1, 25.0, &MotorSolveConfig::default())
        .unwrap_err();
    assert!(matches!(err, MotorError::Core(_)));
}
