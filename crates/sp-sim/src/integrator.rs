//! Fixed-step time integrators.

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "integrator dt must be positive",
            });
        }

        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x' = -a x
    struct Decay {
        a: f64,
    }

    impl TransientModel for Decay {
        type State = f64;

        fn rhs(&mut self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-self.a * x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, s: f64) -> f64 {
            a * s
        }
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let mut model = Decay { a: 0.7 };
        let mut x = 1.0;
        let dt = 0.05;
        for i in 0..40 {
            x = RK4.step(&mut model, i as f64 * dt, &x, dt).unwrap();
        }
        let exact = (-0.7_f64 * 2.0).exp();
        assert!((x - exact).abs() < 1e-7, "{x} vs {exact}");
    }

    #[test]
    fn rejects_non_positive_dt() {
        let mut model = Decay { a: 1.0 };
        assert!(RK4.step(&mut model, 0.0, &1.0, 0.0).is_err());
    }
}
