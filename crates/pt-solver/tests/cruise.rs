//! Required-thrust cruise solves.

use pt_battery::{CellSpec, Chemistry, PackConfig};
use pt_core::sweep::linspace;
use pt_motor::MotorSpec;
use pt_prop::{PropError, PropPerformanceSurface, grid_samples};
use pt_solver::{CruiseSolver, ErrorKind, PowertrainError, Supply, cruise_sweep};

fn motor() -> MotorSpec {
    MotorSpec::new("kv1000", 1000.0, 0.020, 2.0, 10_000.0, 50.0, 800.0).unwrap()
}

fn prop() -> PropPerformanceSurface {
    let rpms = linspace(1000.0, 30_000.0, 30);
    let speeds = linspace(0.0, 40.0, 9);
    let samples = grid_samples(&speeds, &rpms, |v, n| {
        (1.2e-7 * n * n * (1.0 - v / 50.0), 1.86e-10 * n * n * n * (1.0 - 0.004 * v))
    });
    PropPerformanceSurface::new(samples).unwrap()
}

#[test]
fn quad_cruise_on_fixed_supply() {
    let c = CruiseSolver::default()
        .solve_for_thrust(&motor(), &prop(), Supply::Fixed { voltage_v: 14.8 }, 20.0, 40.0, 4, 25.0, 25.0)
        .unwrap();

    assert_eq!(c.thrust_per_motor_n, 10.0);
    assert!((c.motor.rpm - 11_778.0).abs() < 15.0, "rpm {}", c.motor.rpm);
    assert!((c.motor.current_a - 26.0).abs() < 0.2);
    assert!((c.motor.voltage_v - 12.30).abs() < 0.02);
    assert!((c.throttle - c.motor.voltage_v / 14.8).abs() < 1e-12);
    assert!((c.battery_power_w - 4.0 * c.motor.electrical_power_w).abs() < 1e-9);
    assert!((c.battery_current_a - c.battery_power_w / 14.8).abs() < 1e-9);
    assert!((c.system_efficiency - 800.0 / c.battery_power_w).abs() < 1e-12);
    assert!(c.is_within_limits());
}

#[test]
fn pack_sag_can_exceed_throttle() {
    let cell = CellSpec::new("nmc-3000", Chemistry::Nmc, 3000.0, 0.020).unwrap();
    let pack = PackConfig::new(&cell, 4, 2).unwrap();
    let supply = Supply::Pack {
        pack,
        soc_percent: 80.0,
    };
    let solver = CruiseSolver::default();

    let one = solver
        .solve_for_thrust(&motor(), &prop(), supply, 20.0, 10.0, 1, 25.0, 25.0)
        .unwrap();
    assert!(one.battery_voltage_v < 16.0 && one.battery_voltage_v > 14.5);
    assert!(!one.over_throttle);

    // Four motors pull ~120 A through 44 mΩ and sag below the required voltage
    let four = solver
        .solve_for_thrust(&motor(), &prop(), supply, 20.0, 40.0, 4, 25.0, 25.0)
        .unwrap();
    assert!(four.over_throttle);
    assert!(!four.is_within_limits());
}

#[test]
fn thrust_beyond_propeller_is_infeasible() {
    let err = CruiseSolver::default()
        .solve_for_thrust(&motor(), &prop(), Supply::Fixed { voltage_v: 14.8 }, 20.0, 400.0, 1, 25.0, 25.0)
        .unwrap_err();
    assert!(matches!(err, PowertrainError::Prop(PropError::Infeasible { .. })));
    assert_eq!(err.kind(), ErrorKind::Infeasible);
}

#[test]
fn heavy_cruise_flags_over_current() {
    // 60 N from one propeller at hover needs ~22 000 RPM and well over 50 A
    let c = CruiseSolver::default()
        .solve_for_thrust(&motor(), &prop(), Supply::Fixed { voltage_v: 30.0 }, 0.0, 60.0, 1, 25.0, 25.0)
        .unwrap();
    assert!(c.over_current);
    assert_eq!(c.system_efficiency, 0.0);
}

#[test]
fn cruise_sweep_keeps_failures() {
    let points = cruise_sweep(
        &CruiseSolver::default(),
        &motor(),
        &prop(),
        Supply::Fixed { voltage_v: 14.8 },
        4,
        25.0,
        25.0,
        &[(10.0, 30.0), (20.0, 40.0), (45.0, 40.0)],
    );
    assert_eq!(points.len(), 3);
    assert!(points[0].ok().is_some() && points[1].ok().is_some());
    let (t0, t1) = (points[0].throttle.unwrap(), points[1].throttle.unwrap());
    assert!(t0 < t1);
    assert_eq!(Some(t1), points[1].ok().map(|c| c.throttle));
    assert_eq!(points[2].throttle, None);
    assert_eq!(points[2].result.as_ref().unwrap_err().kind(), ErrorKind::OutOfEnvelope);
}
