//! Benchmark scenarios for the powertrain solvers.

use pt_battery::{BatteryError, CellSpec, Chemistry, PackConfig};
use pt_core::sweep::linspace;
use pt_core::{Catalog, CoreError, SweepDefinition};
use pt_motor::{MotorCircuitModel, MotorError, MotorSolveConfig, MotorSpec};
use pt_prop::{PropError, PropId, PropPerformanceSurface, grid_samples};
use pt_solver::{
    CouplingConfig, CruiseSolver, EquilibriumSolver, PowertrainError, Supply, ThermalCoupling, airspeed_sweep,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("scenario {id} requested zero runs")]
    NoRuns { id: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Motor(#[from] MotorError),

    #[error(transparent)]
    Prop(#[from] PropError),

    #[error(transparent)]
    Battery(#[from] BatteryError),

    #[error(transparent)]
    Powertrain(#[from] PowertrainError),
}

/// A benchmark scenario definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkScenario {
    /// Unique identifier for this benchmark.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Motor catalog key
    pub motor: String,
    /// Propeller catalog key
    pub prop: String,
    pub kind: BenchmarkKind,
    pub notes: Option<String>,
}

/// What a scenario times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BenchmarkKind {
    /// Motor speed for a load torque
    MotorSolve { v_supply: f64, torque_nm: f64 },
    /// Propeller RPM for a thrust
    ThrustInversion { airspeed_ms: f64, thrust_n: f64 },
    /// Motor ↔ propeller equilibrium
    Equilibrium { v_supply: f64, airspeed_ms: f64 },
    /// Steady thermal coupling on a 4S2P pack
    PackCoupling { soc_percent: f64, airspeed_ms: f64 },
    /// Cruise solve for a total thrust on four motors
    Cruise { v_supply: f64, airspeed_ms: f64, thrust_n: f64 },
    /// Parallel airspeed sweep
    AirspeedSweep { v_supply: f64, points: usize },
}

/// A single run's timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_time_s: f64,
    /// Solves performed in the run
    pub solves: usize,
    /// Iteration count reported by the solver, where there is one
    pub iterations: Option<usize>,
}

/// Aggregated statistics for multiple runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub run_count: usize,
    pub total_time_median_s: f64,
    pub total_time_min_s: f64,
    pub total_time_max_s: f64,
    pub iterations_median: Option<usize>,
}

/// Complete benchmark result for a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub scenario: BenchmarkScenario,
    pub runs: Vec<RunMetrics>,
    pub aggregate: AggregateMetrics,
}

/// Collection of benchmark results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    pub timestamp: String,
    pub results: Vec<BenchmarkResult>,
}

/// Reference hardware libraries shared by all scenarios.
pub struct Fixture {
    pub motors: Catalog<MotorSpec>,
    pub props: Catalog<PropPerformanceSurface>,
    /// Cell used by pack scenarios
    pub cell: CellSpec,
}

impl Fixture {
    /// Two motors, one cubic-power propeller sampled 1000–30 000 RPM and
    /// 0–40 m/s, and a 3000 mAh NMC cell.
    pub fn reference() -> Result<Self, BenchError> {
        let rpms = linspace(1000.0, 30_000.0, 30);
        let speeds = linspace(0.0, 40.0, 9);
        let samples = grid_samples(&speeds, &rpms, |v, n| {
            (1.2e-7 * n * n * (1.0 - v / 50.0), 1.86e-10 * n * n * n * (1.0 - 0.004 * v))
        });
        let prop_id: PropId = "10x45MR".parse()?;
        let prop = PropPerformanceSurface::new(samples)?.with_id(prop_id.clone());

        Ok(Self {
            motors: Catalog::from_entries(
                "motor",
                [
                    ("ref-1000kv", MotorSpec::new("ref-1000kv", 1000.0, 0.020, 2.0, 10_000.0, 50.0, 800.0)?),
                    ("ref-920kv", MotorSpec::new("ref-920kv", 920.0, 0.028, 1.6, 10_000.0, 40.0, 600.0)?),
                ],
            ),
            props: Catalog::from_entries("propeller", [(prop_id.as_str().to_string(), prop)]),
            cell: CellSpec::new("ref-nmc-3000", Chemistry::Nmc, 3000.0, 0.020)?,
        })
    }
}

fn run_once(scenario: &BenchmarkScenario, fx: &Fixture) -> Result<(usize, Option<usize>), BenchError> {
    let motor = fx.motors.get(&scenario.motor)?;
    let prop = fx.props.get(&scenario.prop)?;
    match scenario.kind {
        BenchmarkKind::MotorSolve { v_supply, torque_nm } => {
            MotorCircuitModel::default().solve_operating_point(
                motor,
                v_supply,
                torque_nm,
                25.0,
                &MotorSolveConfig::default(),
            )?;
            Ok((1, None))
        }
        BenchmarkKind::ThrustInversion { airspeed_ms, thrust_n } => {
            prop.power_for_thrust(airspeed_ms, thrust_n)?;
            Ok((1, None))
        }
        BenchmarkKind::Equilibrium { v_supply, airspeed_ms } => {
            let eq = EquilibriumSolver::default().solve(motor, prop, v_supply, airspeed_ms, 25.0)?;
            Ok((1, Some(eq.outer_iterations)))
        }
        BenchmarkKind::PackCoupling { soc_percent, airspeed_ms } => {
            let pack = PackConfig::new(&fx.cell, 4, 2)?;
            let coupling = ThermalCoupling::new(EquilibriumSolver::default(), CouplingConfig::default());
            let point = coupling.solve_steady(motor, prop, Supply::Pack { pack, soc_percent }, airspeed_ms)?;
            Ok((point.passes, Some(point.passes)))
        }
        BenchmarkKind::Cruise {
            v_supply,
            airspeed_ms,
            thrust_n,
        } => {
            CruiseSolver::default().solve_for_thrust(
                motor,
                prop,
                Supply::Fixed { voltage_v: v_supply },
                airspeed_ms,
                thrust_n,
                4,
                25.0,
                25.0,
            )?;
            Ok((1, None))
        }
        BenchmarkKind::AirspeedSweep { v_supply, points } => {
            let speeds = SweepDefinition::linear(0.0, 40.0, points)?.generate_points();
            let results = airspeed_sweep(&EquilibriumSolver::default(), motor, prop, v_supply, 25.0, &speeds);
            Ok((results.len(), None))
        }
    }
}

/// Run a single benchmark scenario N times.
pub fn run_scenario(scenario: &BenchmarkScenario, times: usize, fx: &Fixture) -> Result<BenchmarkResult, BenchError> {
    if times == 0 {
        return Err(BenchError::NoRuns {
            id: scenario.id.clone(),
        });
    }

    let mut runs = Vec::with_capacity(times);
    for run_idx in 0..times {
        let start = Instant::now();
        let (solves, iterations) = run_once(scenario, fx)?;
        let total_time_s = start.elapsed().as_secs_f64();
        debug!(scenario = %scenario.id, run_idx, total_time_s, "benchmark run");
        runs.push(RunMetrics {
            total_time_s,
            solves,
            iterations,
        });
    }

    let aggregate = compute_aggregates(&runs);
    Ok(BenchmarkResult {
        scenario: scenario.clone(),
        runs,
        aggregate,
    })
}

fn compute_aggregates(runs: &[RunMetrics]) -> AggregateMetrics {
    let mut times: Vec<f64> = runs.iter().map(|r| r.total_time_s).collect();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut iterations: Vec<usize> = runs.iter().filter_map(|r| r.iterations).collect();
    iterations.sort_unstable();

    AggregateMetrics {
        run_count: runs.len(),
        total_time_median_s: times.get(times.len() / 2).copied().unwrap_or(0.0),
        total_time_min_s: times.first().copied().unwrap_or(0.0),
        total_time_max_s: times.last().copied().unwrap_or(0.0),
        iterations_median: iterations.get(iterations.len() / 2).copied(),
    }
}

pub fn default_benchmarks() -> Vec<BenchmarkScenario> {
    vec![
        BenchmarkScenario {
            id: "01_motor".to_string(),
            name: "Motor Operating Point".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::MotorSolve {
                v_supply: 14.8,
                torque_nm: 0.30,
            },
            notes: Some("Damped inner solve only".to_string()),
        },
        BenchmarkScenario {
            id: "02_thrust".to_string(),
            name: "Thrust Inversion".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::ThrustInversion {
                airspeed_ms: 20.0,
                thrust_n: 10.0,
            },
            notes: None,
        },
        BenchmarkScenario {
            id: "03_equilibrium".to_string(),
            name: "Hover Equilibrium".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::Equilibrium {
                v_supply: 14.8,
                airspeed_ms: 0.0,
            },
            notes: None,
        },
        BenchmarkScenario {
            id: "04_pack".to_string(),
            name: "4S2P Pack Thermal Coupling".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::PackCoupling {
                soc_percent: 80.0,
                airspeed_ms: 0.0,
            },
            notes: Some("Voltage sag and cell heating fed back per pass".to_string()),
        },
        BenchmarkScenario {
            id: "05_cruise".to_string(),
            name: "Quad Cruise".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::Cruise {
                v_supply: 14.8,
                airspeed_ms: 20.0,
                thrust_n: 40.0,
            },
            notes: None,
        },
        BenchmarkScenario {
            id: "06_sweep".to_string(),
            name: "Airspeed Sweep".to_string(),
            motor: "ref-1000kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::AirspeedSweep {
                v_supply: 14.8,
                points: 41,
            },
            notes: Some("rayon fan-out over independent solves".to_string()),
        },
        BenchmarkScenario {
            id: "07_equilibrium_920".to_string(),
            name: "Hover Equilibrium, 920 kV".to_string(),
            motor: "ref-920kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::Equilibrium {
                v_supply: 14.8,
                airspeed_ms: 0.0,
            },
            notes: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_benchmarks_are_defined() {
        let benchmarks = default_benchmarks();
        assert!(!benchmarks.is_empty());
        assert!(benchmarks.iter().all(|b| !b.id.is_empty()));
        assert!(benchmarks.iter().all(|b| !b.name.is_empty()));
    }

    #[test]
    fn every_default_scenario_runs() {
        let fx = Fixture::reference().unwrap();
        for scenario in default_benchmarks() {
            let result = run_scenario(&scenario, 2, &fx).unwrap();
            assert_eq!(result.aggregate.run_count, 2);
            assert!(result.aggregate.total_time_min_s <= result.aggregate.total_time_max_s);
        }
    }

    #[test]
    fn zero_runs_rejected() {
        let fx = Fixture::reference().unwrap();
        let scenario = &default_benchmarks()[0];
        assert!(matches!(run_scenario(scenario, 0, &fx), Err(BenchError::NoRuns { .. })));
    }

    #[test]
    fn unknown_hardware_is_reported() {
        let fx = Fixture::reference().unwrap();
        let mut scenario = default_benchmarks()[0].clone();
        scenario.motor = "missing".to_string();
        let err = run_scenario(&scenario, 1, &fx).unwrap_err();
        assert!(matches!(err, BenchError::Core(CoreError::NotFound { .. })));
    }

    #[test]
    fn benchmark_scenario_serializes() {
        let scenario = BenchmarkScenario {
            id: "test".to_string(),
            name: "Test Scenario".to_string(),
            motor: "ref-920kv".to_string(),
            prop: "10x45MR".to_string(),
            kind: BenchmarkKind::Equilibrium {
                v_supply: 11.1,
                airspeed_ms: 5.0,
            },
            notes: Some("Test note".to_string()),
        };

        let json = serde_json::to_string(&scenario).expect("should serialize");
        let deserialized: BenchmarkScenario = serde_json::from_str(&json).expect("should deserialize");

        assert_eq!(deserialized.id, scenario.id);
        assert_eq!(deserialized.kind, scenario.kind);
    }

    #[test]
    fn aggregates_take_median() {
        let runs: Vec<RunMetrics> = [0.3, 0.1, 0.2]
            .into_iter()
            .map(|t| RunMetrics {
                total_time_s: t,
                solves: 1,
                iterations: Some(4),
            })
            .collect();
        let agg = compute_aggregates(&runs);
        assert_eq!(agg.total_time_median_s, 0.2);
        assert_eq!(agg.total_time_min_s, 0.1);
        assert_eq!(agg.total_time_max_s, 0.3);
        assert_eq!(agg.iterations_median, Some(4));
    }
}
