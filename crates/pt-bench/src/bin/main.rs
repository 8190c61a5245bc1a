//! Standalone benchmark runner for the powertrain solvers.

use pt_bench::{BenchmarkSuite, Fixture, default_benchmarks, run_scenario};
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

const RUNS: usize = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let crate_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = crate_path
        .parent()
        .and_then(|p| p.parent())
        .ok_or("Could not determine repo root")?
        .to_path_buf();

    println!("Powertrain Benchmark Suite");
    println!("==========================\n");

    let fixture = Fixture::reference()?;
    let benchmarks = default_benchmarks();
    println!("Running {} benchmarks, {} runs each...\n", benchmarks.len(), RUNS);

    let mut results = Vec::new();
    for (idx, scenario) in benchmarks.iter().enumerate() {
        print!("[{}/{}] {} ... ", idx + 1, benchmarks.len(), scenario.name);
        std::io::Write::flush(&mut std::io::stdout())?;

        match run_scenario(scenario, RUNS, &fixture) {
            Ok(result) => {
                println!("OK ({:.1} µs median)", result.aggregate.total_time_median_s * 1e6);
                results.push(result);
            }
            Err(e) => {
                println!("FAILED");
                eprintln!("  Error: {}", e);
            }
        }
    }

    println!("\n==========================");
    println!("Benchmark Results Summary");
    println!("==========================\n");

    for result in &results {
        let agg = &result.aggregate;
        println!("{}", result.scenario.name);
        println!("  Kind: {:?}", result.scenario.kind);
        println!(
            "  Time: {:.1} µs (median), min: {:.1} µs, max: {:.1} µs",
            agg.total_time_median_s * 1e6,
            agg.total_time_min_s * 1e6,
            agg.total_time_max_s * 1e6
        );
        if let Some(iters) = agg.iterations_median {
            println!("  Iterations: {} (median)", iters);
        }
        println!();
    }

    let timestamp = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?.as_secs();
    let baseline_json = serde_json::to_string_pretty(&BenchmarkSuite {
        timestamp: format!("timestamp_{}", timestamp),
        results,
    })?;

    let baseline_path = repo_root.join("benchmarks").join("baseline.json");
    if let Some(dir) = baseline_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&baseline_path, baseline_json)?;
    println!("Baseline saved to: {}", baseline_path.display());

    Ok(())
}
