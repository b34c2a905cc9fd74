//! TransientModel trait for the small ODEs stepped by the solvers.

use crate::error::SimResult;

/// An ODE system x' = f(t, x) that can be advanced by an [`crate::Integrator`].
///
/// State arithmetic is supplied by the model so integrators stay generic over
/// scalar and fixed-size vector states.
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes &mut self so models may cache intermediate quantities.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
