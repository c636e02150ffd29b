// tests/property_test.rs
use approx::assert_relative_eq;
use heston_variance::analytics::cir_moments;
use heston_variance::grid::TimeGrid;
use heston_variance::models::heston::HestonParams;
use heston_variance::rng::RngFactory;
use heston_variance::schemes::quadratic_exponential::{ExponentialLaw, QuadraticLaw};
use heston_variance::schemes::{
    ConditionalMoments, QuadraticExponentialScheme, SchemeKind, TransitionCoefficients,
    VariancePathSimulator, VarianceScheme,
};
use proptest::prelude::*;

fn params_strategy() -> impl Strategy<Value = HestonParams> {
    (0.1f64..5.0, 0.01f64..0.2, 0.05f64..2.0, 0.0f64..0.3).prop_map(|(kappa, theta, xi, v0)| {
        HestonParams {
            kappa,
            theta,
            xi,
            v0,
            ..Default::default()
        }
    })
}

fn grid_strategy() -> impl Strategy<Value = TimeGrid> {
    prop::collection::vec(0.001f64..0.5, 1..12).prop_map(|steps| {
        let mut points = Vec::with_capacity(steps.len() + 1);
        let mut t = 0.0;
        points.push(t);
        for dt in steps {
            t += dt;
            points.push(t);
        }
        TimeGrid::new(points).expect("Strictly increasing grid")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_paths_stay_finite_and_non_negative(
        params in params_strategy(),
        grid in grid_strategy(),
        seed in any::<u64>(),
    ) {
        let factory = RngFactory::new(seed);
        for kind in [SchemeKind::TruncatedGaussian, SchemeKind::QuadraticExponential] {
            let scheme = VarianceScheme::new(kind, grid.clone(), params)
                .expect("Valid parameters");
            for path_id in 0..16 {
                let mut rng = factory.create_counter_rng(path_id);
                let path = scheme.generate_path(&mut rng).expect("Path generation");
                prop_assert_eq!(path.len(), grid.len());
                prop_assert_eq!(path[0], params.v0);
                for v in &path {
                    prop_assert!(v.is_finite() && *v >= 0.0, "{:?} produced {}", kind, v);
                }
            }
        }
    }

    #[test]
    fn test_coefficients_reproduce_exact_conditional_mean(
        params in params_strategy(),
        grid in grid_strategy(),
        v in 0.0f64..1.0,
    ) {
        let coefficients = TransitionCoefficients::compute(&grid, &params);
        for (i, dt) in grid.increments().into_iter().enumerate() {
            let m = coefficients.moments(i, v).expect("Valid state");
            let exact_mean = cir_moments::conditional_mean(v, params.kappa, params.theta, dt);
            let exact_var =
                cir_moments::conditional_variance(v, params.kappa, params.theta, params.xi, dt);
            assert_relative_eq!(m.mean, exact_mean, max_relative = 1e-10);
            assert_relative_eq!(m.variance, exact_var, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_quadratic_law_matches_moments(mean in 1e-4f64..1.0, psi in 0.01f64..2.0) {
        let moments = ConditionalMoments { mean, variance: psi * mean * mean };
        let law = QuadraticLaw::from_moments(&moments);
        // a(b + Z)^2 has mean a(1 + b^2) and variance a^2 (4b^2 + 2).
        let b2 = law.b * law.b;
        assert_relative_eq!(law.a * (1.0 + b2), moments.mean, max_relative = 1e-10);
        assert_relative_eq!(
            law.a * law.a * (4.0 * b2 + 2.0),
            moments.variance,
            max_relative = 1e-8
        );
        prop_assert!(law.a > 0.0 && law.b >= 0.0);
    }

    #[test]
    fn test_exponential_law_matches_moments(mean in 1e-4f64..1.0, psi in 1.0f64..50.0) {
        let moments = ConditionalMoments { mean, variance: psi * mean * mean };
        let law = ExponentialLaw::from_moments(&moments);
        let first = (1.0 - law.p) / law.beta;
        let second = 2.0 * (1.0 - law.p) / (law.beta * law.beta);
        assert_relative_eq!(first, moments.mean, max_relative = 1e-10);
        assert_relative_eq!(second - first * first, moments.variance, max_relative = 1e-8);
        prop_assert!((0.0..1.0).contains(&law.p));
    }

    #[test]
    fn test_qe_exponential_branch_is_monotone(
        mean in 1e-4f64..1.0,
        psi in 1.6f64..50.0,
        u1 in 1e-9f64..1.0,
        u2 in 1e-9f64..1.0,
    ) {
        let scheme = QuadraticExponentialScheme::with_defaults(
            TimeGrid::uniform(1.0, 1).expect("Valid grid"),
            HestonParams::default(),
        )
        .expect("Valid parameters");
        let moments = ConditionalMoments { mean, variance: psi * mean * mean };
        let p = ExponentialLaw::from_moments(&moments).p;
        let (lo, hi) = if u1 <= u2 { (u1, u2) } else { (u2, u1) };
        let x_lo = scheme.sample_with_uniform(&moments, lo).expect("Valid draw");
        let x_hi = scheme.sample_with_uniform(&moments, hi).expect("Valid draw");
        prop_assert!(x_lo <= x_hi);
        if lo <= p {
            prop_assert_eq!(x_lo, 0.0);
        }
    }
}
