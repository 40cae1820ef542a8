/// Assembly of the symbolic ODE system from a reaction network: mass-action
/// rate expressions with Gibbs/Eyring coefficients, full and reduced right
/// hand sides, analytical Jacobians and lambdified numeric callables.
#[allow(non_snake_case)]
pub mod createRHS;
/// Initial value problem task for a reaction network: orchestrates the
/// concentration configuration, rate assembly, conservation-law reduction and
/// the delegation to the external ODE solver, then recovers the eliminated
/// species and reports invariant drift over the computed trajectory.
#[allow(non_snake_case)]
pub mod SimpleKineticIVP;
