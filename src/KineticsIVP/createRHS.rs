//! # ODE Right-Hand-Side Assembly
//!
//! Transforms a reaction network into the symbolic system of concentration
//! balance equations an ODE solver consumes.
//!
//! ## Mathematical Framework
//!
//! - Reaction rates: `R_j = k_j * prod_i [C_i]^nu_ij` over reactants and
//!   catalytic species; a reversible step subtracts the backward term
//!   `(k_j / K_j) * prod_i [C_i]^nu_ij` over products and catalysts, where
//!   `K_j` is the Gibbs equilibrium constant of the step.
//! - Species balances: `dC_i/dt = sum_j nu_ij * R_j` with net stoichiometric
//!   coefficients `nu_ij` (products minus reactants).
//! - Reduced balances: eliminated concentrations are replaced by their
//!   closed-form invariant expressions, so the differential variables are the
//!   free species only and the Jacobian of the reduced system is regular when
//!   the elimination used the full invariant rank.
//!
//! Rate coefficients are evaluated numerically from the parameter map when
//! the system is meant for integration, or kept symbolic in the temperature
//! variable for inspection and documentation.
use crate::Kinetics::User_network::{Reaction, ReactionNetwork, ReactionRate};
use crate::Kinetics::rate_laws::{KineticsError, PhysicalConstants};
use crate::Reduction::reduced_system::ReducedSystem;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// product of concentration powers for one side of a reaction, catalysts included
fn mass_action_product(side: &[(String, usize)], catalysts: &[(String, usize)]) -> Expr {
    let mut product = Expr::Const(1.0);
    for (name, mult) in side.iter().chain(catalysts.iter()) {
        let c = Expr::Var(name.clone());
        if *mult == 1 {
            product = product * c;
        } else {
            product = product * c.pow(Expr::Const(*mult as f64));
        }
    }
    product
}

fn rate_expr_for_reaction(
    reaction: &Reaction,
    params: &HashMap<String, f64>,
    consts: &PhysicalConstants,
) -> Result<Expr, KineticsError> {
    let forward_product = mass_action_product(&reaction.reactants, &reaction.catalysts);
    match &reaction.rate {
        ReactionRate::Irreversible(law) => {
            let k = law.K_const(params, consts)?;
            Ok((Expr::Const(k) * forward_product).symplify())
        }
        ReactionRate::Reversible {
            forward,
            equilibrium,
        } => {
            let k_f = forward.K_const(params, consts)?;
            let k_eq = equilibrium.K_const(params, consts)?;
            let k_b = k_f / k_eq;
            let backward_product = mass_action_product(&reaction.products, &reaction.catalysts);
            let rate = Expr::Const(k_f) * forward_product - Expr::Const(k_b) * backward_product;
            Ok(rate.symplify())
        }
    }
}

/// Symbolic rate expression of each reaction with numeric coefficients
/// resolved from the parameter map. One expression per reaction, in network
/// order; the variables are the species concentrations.
pub fn reaction_rate_exprs(
    network: &ReactionNetwork,
    params: &HashMap<String, f64>,
    consts: &PhysicalConstants,
) -> Result<Vec<Expr>, KineticsError> {
    network
        .reactions
        .iter()
        .map(|reaction| rate_expr_for_reaction(reaction, params, consts))
        .collect()
}

/// Same as [`reaction_rate_exprs`] but with the temperature kept symbolic, so
/// the returned expressions document the full coefficient formulas.
pub fn reaction_rate_exprs_sym(
    network: &ReactionNetwork,
    params: &HashMap<String, f64>,
    consts: &PhysicalConstants,
) -> Result<Vec<Expr>, KineticsError> {
    let temperature = Expr::Var("T".to_string());
    network
        .reactions
        .iter()
        .map(|reaction| {
            let forward_product = mass_action_product(&reaction.reactants, &reaction.catalysts);
            match &reaction.rate {
                ReactionRate::Irreversible(law) => {
                    let k = law.K_expr(params, consts, temperature.clone())?;
                    Ok((k * forward_product).symplify())
                }
                ReactionRate::Reversible {
                    forward,
                    equilibrium,
                } => {
                    let k_f = forward.K_expr(params, consts, temperature.clone())?;
                    let k_eq = equilibrium.K_expr(params, consts, temperature.clone())?;
                    let backward_product =
                        mass_action_product(&reaction.products, &reaction.catalysts);
                    let rate = k_f.clone() * forward_product
                        - (k_f / k_eq) * backward_product;
                    Ok(rate.symplify())
                }
            }
        })
        .collect()
}

/// forward rate coefficient of every reaction, for diagnostic inspection
pub fn reaction_coefficients(
    network: &ReactionNetwork,
    params: &HashMap<String, f64>,
    consts: &PhysicalConstants,
) -> Result<Vec<f64>, KineticsError> {
    network
        .reactions
        .iter()
        .map(|reaction| match &reaction.rate {
            ReactionRate::Irreversible(law) => law.K_const(params, consts),
            ReactionRate::Reversible { forward, .. } => forward.K_const(params, consts),
        })
        .collect()
}

/// Full system of concentration balances, one equation per species in network
/// order. Returns the right-hand sides and the unknown names.
pub fn create_full_rhs(network: &ReactionNetwork, rates: &[Expr]) -> (Vec<Expr>, Vec<String>) {
    let unknowns = network.species_names();
    let stoich = network.stoich_matrix();
    let mut eq_system = Vec::with_capacity(unknowns.len());
    for i in 0..unknowns.len() {
        let mut balance = Expr::Const(0.0);
        for (j, rate) in rates.iter().enumerate() {
            let nu = stoich[(j, i)];
            if nu != 0.0 {
                balance = balance + Expr::Const(nu) * rate.clone();
            }
        }
        eq_system.push(balance.symplify());
    }
    (eq_system, unknowns)
}

/// Balance equations of the free species only, with every eliminated species
/// replaced by its closed-form invariant expression.
pub fn create_reduced_rhs(
    network: &ReactionNetwork,
    reduced: &ReducedSystem,
    rates: &[Expr],
) -> (Vec<Expr>, Vec<String>) {
    let (full, _) = create_full_rhs(network, rates);
    let elimination = reduced.elimination_exprs();
    let mut eq_system = Vec::with_capacity(reduced.free_indices.len());
    for &i in reduced.free_indices.iter() {
        let mut balance = full[i].clone();
        for (name, expr) in reduced.eliminated_species.iter().zip(elimination.iter()) {
            balance = balance.substitute_variable(name, expr);
        }
        eq_system.push(balance.symplify());
    }
    (eq_system, reduced.free_species.clone())
}

/// analytical Jacobian, entry (i, j) = d(rhs_i)/d(unknown_j)
pub fn jacobian_exprs(eq_system: &[Expr], unknowns: &[String]) -> Vec<Vec<Expr>> {
    eq_system
        .iter()
        .map(|eq| {
            unknowns
                .iter()
                .map(|var| eq.clone().diff(var).symplify())
                .collect()
        })
        .collect()
}

/// Numeric right-hand-side callable over the unknown ordering. The time
/// argument is accepted for the integrator interface; the assembled systems
/// are autonomous.
pub fn lambdify_rhs(
    eq_system: &[Expr],
    unknowns: &[String],
) -> Box<dyn Fn(f64, &DVector<f64>) -> DVector<f64>> {
    let funs: Vec<_> = eq_system
        .iter()
        .map(|eq| {
            let names: Vec<&str> = unknowns.iter().map(|s| s.as_str()).collect();
            eq.clone().lambdify_owned(names)
        })
        .collect();
    Box::new(move |_t: f64, y: &DVector<f64>| {
        let values: Vec<f64> = y.iter().copied().collect();
        DVector::from_vec(funs.iter().map(|f| f(values.clone())).collect())
    })
}

/// Numeric Jacobian callable matching [`lambdify_rhs`] ordering.
pub fn lambdify_jacobian(
    jacobian: &[Vec<Expr>],
    unknowns: &[String],
) -> Box<dyn Fn(f64, &DVector<f64>) -> DMatrix<f64>> {
    let n = unknowns.len();
    let funs: Vec<Vec<_>> = jacobian
        .iter()
        .map(|row| {
            row.iter()
                .map(|entry| {
                    let names: Vec<&str> = unknowns.iter().map(|s| s.as_str()).collect();
                    entry.clone().lambdify_owned(names)
                })
                .collect()
        })
        .collect();
    Box::new(move |_t: f64, y: &DVector<f64>| {
        let values: Vec<f64> = y.iter().copied().collect();
        let mut matrix = DMatrix::zeros(funs.len(), n);
        for (i, row) in funs.iter().enumerate() {
            for (j, f) in row.iter().enumerate() {
                matrix[(i, j)] = f(values.clone());
            }
        }
        matrix
    })
}
