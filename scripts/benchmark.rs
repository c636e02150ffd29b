// scripts/benchmark.rs
use heston_variance::analytics::cir_moments;
use heston_variance::grid::TimeGrid;
use heston_variance::math_utils::Timer;
use heston_variance::mc::ensemble::{EnsembleConfig, PathStatistics};
use heston_variance::models::heston::HestonParams;
use heston_variance::schemes::{SchemeKind, VariancePathSimulator, VarianceScheme};
use heston_variance::SdeResult;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process::Command;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rust_version: String,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rust_version: Self::get_rust_version(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_cpu_model() -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/cpuinfo")
                .ok()
                .and_then(|content| {
                    content
                        .lines()
                        .find(|line| line.starts_with("model name"))
                        .and_then(|line| line.split(':').nth(1))
                        .map(|s| s.trim().to_string())
                })
                .unwrap_or_else(|| "Unknown CPU".to_string())
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("sysctl")
                .args(["-n", "machdep.cpu.brand_string"])
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown CPU".to_string())
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "Unknown CPU".to_string()
        }
    }

    fn get_rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    paths: usize,
    steps: usize,
    setup_ms: f64,
    time_ms: f64,
    throughput_steps_per_sec: f64,
    terminal_mean: f64,
    exact_mean: f64,
    relative_error: f64,
}

/// Parameter sets: Feller satisfied, and the hard low-Feller-ratio regime.
fn parameter_sets() -> Vec<(&'static str, HestonParams)> {
    vec![
        (
            "feller",
            HestonParams {
                v0: 0.04,
                kappa: 2.0,
                theta: 0.04,
                xi: 0.3,
                ..Default::default()
            },
        ),
        (
            "low-feller",
            HestonParams {
                v0: 0.04,
                kappa: 0.5,
                theta: 0.04,
                xi: 1.0,
                ..Default::default()
            },
        ),
    ]
}

fn run_scheme_benchmarks() -> SdeResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let maturity = 1.0;
    let step_configs = [4, 52, 252];
    let paths = 100_000;

    for (label, params) in parameter_sets() {
        for &steps in &step_configs {
            let grid = TimeGrid::uniform(maturity, steps)?;
            let exact_mean = cir_moments::expected_variance_path(&params, &grid)[steps];

            for kind in [SchemeKind::TruncatedGaussian, SchemeKind::QuadraticExponential] {
                println!("Benchmarking {} ({}, {} steps)...", kind.name(), label, steps);

                let mut timer = Timer::new();
                let scheme = VarianceScheme::new(kind, grid.clone(), params)?;
                let setup_ms = timer.elapsed_ms();

                timer.start();
                let stats = PathStatistics::simulate(&scheme, &EnsembleConfig { paths, seed: 42 })?;
                let time_ms = timer.elapsed_ms();

                let terminal_mean = stats.mean[steps];
                results.push(BenchmarkResult {
                    name: format!("{} {}", scheme.scheme_name(), label),
                    paths,
                    steps,
                    setup_ms,
                    time_ms,
                    throughput_steps_per_sec: (paths * steps) as f64 / (time_ms / 1000.0),
                    terminal_mean,
                    exact_mean,
                    relative_error: (terminal_mean - exact_mean).abs() / exact_mean,
                });
            }
        }
    }

    Ok(results)
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# Rust Version: {}", system_info.rust_version)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,Paths,Steps,Setup_ms,Time_ms,Throughput_steps_per_sec,Terminal_Mean,Exact_Mean,Relative_Error"
    )?;
    for r in results {
        writeln!(
            file,
            "{},{},{},{:.3},{:.2},{:.0},{:.8},{:.8},{:.6}",
            r.name,
            r.paths,
            r.steps,
            r.setup_ms,
            r.time_ms,
            r.throughput_steps_per_sec,
            r.terminal_mean,
            r.exact_mean,
            r.relative_error
        )?;
    }

    Ok(())
}

fn main() -> SdeResult<()> {
    println!("heston-variance Benchmark Suite");
    println!("===============================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let results = run_scheme_benchmarks()?;

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<36} {:>6} {:>10} {:>10} {:>14} {:>10} {:>10}",
        "Benchmark", "Steps", "Setup (ms)", "Time (ms)", "Steps/sec", "E[V_T]", "Rel Error"
    );
    println!("{:-<96}", "");
    for r in &results {
        println!(
            "{:<36} {:>6} {:>10.2} {:>10.2} {:>14.0} {:>10.6} {:>9.3}%",
            r.name,
            r.steps,
            r.setup_ms,
            r.time_ms,
            r.throughput_steps_per_sec,
            r.terminal_mean,
            r.relative_error * 100.0
        );
    }
    println!("{:=<96}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    match write_results_to_csv(&results, &system_info, &filename) {
        Ok(()) => println!("\nResults saved to: {}", filename),
        Err(e) => eprintln!("\nCould not write {}: {}", filename, e),
    }

    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!("3. Run: cargo run --bin benchmark --release");

    Ok(())
}
