// demos/variance_paths.rs
//! Mean variance paths of the TG and QE schemes against the exact CIR mean.
//!
//! Run with `RUST_LOG=debug` to see the calibration table being built.
use heston_variance::analytics::cir_moments;
use heston_variance::grid::TimeGrid;
use heston_variance::math_utils::Timer;
use heston_variance::mc::ensemble::{EnsembleConfig, PathStatistics};
use heston_variance::models::heston::HestonParams;
use heston_variance::rng::seed_rng_from_u64;
use heston_variance::schemes::{SchemeKind, VariancePathSimulator, VarianceScheme};
use heston_variance::SdeResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> SdeResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("Heston Variance Path Simulation");
    println!("===============================");

    // Feller condition fails here (2κθ = 0.04 < ξ² = 1), so paths hit zero.
    let params = HestonParams {
        v0: 0.04,
        kappa: 0.5,
        theta: 0.04,
        xi: 1.0,
        ..Default::default()
    };
    println!(
        "κ = {}, θ = {}, ξ = {}, V0 = {}, Feller ratio ξ²/(2κθ) = {:.2}",
        params.kappa,
        params.theta,
        params.xi,
        params.v0,
        params.feller_ratio()
    );

    let grid = TimeGrid::uniform(5.0, 20)?;
    let exact = cir_moments::expected_variance_path(&params, &grid);
    let cfg = EnsembleConfig {
        paths: 50_000,
        seed: 2024,
    };

    for kind in [SchemeKind::TruncatedGaussian, SchemeKind::QuadraticExponential] {
        let timer = Timer::new();
        let scheme = VarianceScheme::new(kind, grid.clone(), params)?;
        let setup = timer.elapsed_ms();

        let timer = Timer::new();
        let stats = PathStatistics::simulate(&scheme, &cfg)?;
        let elapsed = timer.elapsed_ms();

        println!("\n{} ({} paths)", scheme.scheme_name(), stats.paths);
        println!("  setup {:.2} ms, simulation {:.2} ms", setup, elapsed);
        println!("  {:>6} {:>12} {:>12} {:>10}", "t", "E[V_t] MC", "exact", "P(V=0)");
        for (i, t) in grid.points().iter().enumerate().step_by(4) {
            println!(
                "  {:>6.2} {:>12.6} {:>12.6} {:>10.4}",
                t, stats.mean[i], exact[i], stats.zero_fraction[i]
            );
        }
    }

    // One path through a boxed trait object.
    let boxed: Box<dyn VariancePathSimulator> = Box::new(VarianceScheme::new(
        SchemeKind::QuadraticExponential,
        grid,
        params,
    )?);
    let mut rng = seed_rng_from_u64(7);
    let path = boxed.clone().generate_path(&mut rng)?;
    println!("\nSingle QE path:");
    for v in path.iter().step_by(4) {
        print!(" {:.5}", v);
    }
    println!();

    Ok(())
}
