// src/rng.rs
//! Random Number Generation for Variance Path Simulation
//!
//! # Design
//!
//! The transition schemes never own a generator. Every call to
//! `generate_path` borrows a [`RandomSource`] supplied by the caller, which
//! keeps a simulator immutable after construction and lets many threads share
//! one simulator as long as each thread brings its own stream.
//!
//! Three kinds of source are provided:
//! - any `rand::Rng` (through a blanket impl),
//! - [`CounterRng`], a counter-based stream keyed by `(seed, path_id)` so that
//!   parallel ensembles are reproducible regardless of thread count,
//! - [`FixedSource`], a constant stream used for regression fixtures.
//!
//! # Box-Muller Transform
//!
//! `CounterRng` converts uniforms to normals with:
//! ```text
//! Z₁ = √(-2ln(U₁)) * cos(2πU₂)
//! Z₂ = √(-2ln(U₁)) * sin(2πU₂)
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Open01, StandardNormal};

/// Source of the two variates the schemes consume.
pub trait RandomSource {
    /// Standard normal draw.
    fn gaussian(&mut self) -> f64;

    /// Uniform draw on the open interval (0, 1).
    fn uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn gaussian(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    fn uniform(&mut self) -> f64 {
        Open01.sample(self)
    }
}

/// Counter-based RNG for reproducible parallel simulations
///
/// # Algorithm
///
/// splitmix64 over `base_seed + counter`:
/// ```text
/// z = base_seed + counter
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
///
/// The second Box-Muller variate is cached per instance, so two streams never
/// interfere with each other.
#[derive(Debug, Clone)]
pub struct CounterRng {
    base_seed: u64,
    counter: u64,
    spare: Option<f64>,
}

impl CounterRng {
    pub fn new(base_seed: u64, counter: u64) -> Self {
        Self {
            base_seed,
            counter,
            spare: None,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        let mut z = self.base_seed.wrapping_add(self.counter);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
        z ^ (z >> 31)
    }

    /// Uniform on (0, 1): the 53-bit lattice shifted by half a step so that
    /// neither endpoint is reachable.
    pub fn open_uniform(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 + 0.5) * (1.0 / 9007199254740992.0) // 2^53
    }

    pub fn normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }

        let u1 = self.open_uniform();
        let u2 = self.open_uniform();

        let mag = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(mag * angle.sin());

        mag * angle.cos()
    }
}

impl RandomSource for CounterRng {
    fn gaussian(&mut self) -> f64 {
        self.normal()
    }

    fn uniform(&mut self) -> f64 {
        self.open_uniform()
    }
}

/// Deterministic source returning the same pair of values on every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSource {
    pub gaussian: f64,
    pub uniform: f64,
}

impl FixedSource {
    pub fn new(gaussian: f64, uniform: f64) -> Self {
        Self { gaussian, uniform }
    }
}

impl RandomSource for FixedSource {
    fn gaussian(&mut self) -> f64 {
        self.gaussian
    }

    fn uniform(&mut self) -> f64 {
        self.uniform
    }
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Create a counter RNG for a specific path/thread
    pub fn create_counter_rng(&self, path_id: u64) -> CounterRng {
        // Spread path ids so neighbouring paths do not share counter ranges.
        CounterRng::new(self.base_seed, path_id.wrapping_mul(0x9e3779b97f4a7c15))
    }
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
