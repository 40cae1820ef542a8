//! # Invariant-Based Species Elimination
//!
//! Every independent conservation law of a reaction network makes one species
//! concentration an affine function of the others. Integrating the full
//! system therefore drags along redundant differential variables and a
//! structurally singular Jacobian. This module eliminates a caller-chosen
//! subset of species against the invariant basis:
//!
//! ```text
//! V_E * c_E + V_F * c_F = b,   b = V * c(0)
//! c_E = V_E^{-1} * b - V_E^{-1} * V_F * c_F
//! ```
//!
//! where `V` is the invariant basis restricted to the rows selected for the
//! elimination, `E` the eliminated and `F` the free species. The selection of
//! rows and the inversion of `V_E` are done in exact rational arithmetic; a
//! non-invertible choice of eliminated species fails with
//! `SingularElimination` instead of producing wrong recovery formulas.
//!
//! Eliminating fewer species than the invariant rank is allowed but leaves
//! the reduced Jacobian singular; the constructed system carries an
//! `underdetermined` diagnostic flag and a warning is logged.
use crate::Kinetics::User_network::ReactionNetwork;
use crate::Kinetics::rate_laws::KineticsError;
use crate::Reduction::invariant_analyzer::ConservationAnalyzer;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::warn;
use nalgebra::{DMatrix, DVector};
use num_rational::Rational64;
use num_traits::{One, Zero};

fn to_f64(r: Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

fn matrix_to_f64(m: &DMatrix<Rational64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| to_f64(m[(i, j)]))
}

/// Exact inverse by Gauss-Jordan on the augmented matrix. None if singular.
fn rational_invert(b: &DMatrix<Rational64>) -> Option<DMatrix<Rational64>> {
    let n = b.nrows();
    if b.ncols() != n {
        return None;
    }
    let mut aug: DMatrix<Rational64> = DMatrix::zeros(n, 2 * n);
    for i in 0..n {
        for j in 0..n {
            aug[(i, j)] = b[(i, j)];
        }
        aug[(i, n + i)] = Rational64::one();
    }
    for col in 0..n {
        let mut pivot = None;
        for r in col..n {
            if !aug[(r, col)].is_zero() {
                pivot = Some(r);
                break;
            }
        }
        let pivot = pivot?;
        aug.swap_rows(col, pivot);
        let p = aug[(col, col)];
        for c in 0..2 * n {
            aug[(col, c)] = aug[(col, c)] / p;
        }
        for r in 0..n {
            if r != col && !aug[(r, col)].is_zero() {
                let factor = aug[(r, col)];
                for c in 0..2 * n {
                    let v = aug[(col, c)] * factor;
                    aug[(r, c)] = aug[(r, c)] - v;
                }
            }
        }
    }
    let mut inv = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            inv[(i, j)] = aug[(i, n + j)];
        }
    }
    Some(inv)
}

/// Picks rows of `b` (invariants x eliminated-species columns) that form an
/// invertible square block, by forward elimination with exact pivoting.
/// Returns the original row indices, one per column, or fewer if the columns
/// are rank deficient.
fn select_pivot_rows(b: &DMatrix<Rational64>) -> Vec<usize> {
    let (nrows, ncols) = b.shape();
    let mut work = b.clone();
    let mut row_order: Vec<usize> = (0..nrows).collect();
    let mut selected = Vec::new();
    let mut pivot_row = 0usize;
    for col in 0..ncols {
        if pivot_row >= nrows {
            break;
        }
        let mut pivot = None;
        for r in pivot_row..nrows {
            if !work[(r, col)].is_zero() {
                pivot = Some(r);
                break;
            }
        }
        let pivot = match pivot {
            Some(r) => r,
            None => continue,
        };
        work.swap_rows(pivot_row, pivot);
        row_order.swap(pivot_row, pivot);
        selected.push(row_order[pivot_row]);
        let p = work[(pivot_row, col)];
        for r in pivot_row + 1..nrows {
            if !work[(r, col)].is_zero() {
                let factor = work[(r, col)] / p;
                for c in col..ncols {
                    let v = work[(pivot_row, c)] * factor;
                    work[(r, c)] = work[(r, c)] - v;
                }
            }
        }
        pivot_row += 1;
    }
    selected
}

/// Partition of network species into free (integrated) and eliminated
/// (recovered in closed form) variables. Constructed once from a network, an
/// elimination choice and the initial concentrations; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub free_species: Vec<String>,
    pub free_indices: Vec<usize>,
    pub eliminated_species: Vec<String>,
    pub eliminated_indices: Vec<usize>,
    /// selected invariant rows, one per eliminated species, over all species
    pub invariant_rows: DMatrix<Rational64>,
    /// V_E^{-1}
    pub recovery_offset: DMatrix<Rational64>,
    /// V_E^{-1} * V_F
    pub recovery_free: DMatrix<Rational64>,
    /// invariant values at the construction-time initial state
    pub invariant_values: DVector<f64>,
    pub initial_concentrations: DVector<f64>,
    /// set when fewer species were eliminated than the invariant rank; the
    /// system stays integrable but the reduced Jacobian stays singular
    pub underdetermined: bool,
}

impl ReducedSystem {
    pub fn new(
        network: &ReactionNetwork,
        eliminate: &[&str],
        c0: &DVector<f64>,
    ) -> Result<Self, KineticsError> {
        let n_species = network.species.len();
        if c0.len() != n_species {
            return Err(KineticsError::InvalidConfiguration(format!(
                "initial concentration vector length {} does not match {} species",
                c0.len(),
                n_species
            )));
        }
        let mut eliminated_indices = Vec::new();
        for name in eliminate {
            let i = network.index_of(name).ok_or_else(|| {
                KineticsError::MalformedNetwork(format!(
                    "eliminated species '{}' is not in the network",
                    name
                ))
            })?;
            if eliminated_indices.contains(&i) {
                return Err(KineticsError::InvalidConfiguration(format!(
                    "species '{}' listed twice in the elimination set",
                    name
                )));
            }
            eliminated_indices.push(i);
        }

        let mut analyzer = ConservationAnalyzer::from_network(network);
        analyzer.analyze();
        analyzer.verify_reactions(network)?;
        let rank = analyzer.rank;
        let m = eliminated_indices.len();
        if m > rank {
            return Err(KineticsError::SingularElimination(format!(
                "cannot eliminate {} species with only {} independent invariants",
                m, rank
            )));
        }
        if m < rank {
            warn!(
                "eliminating {} species while the invariant rank is {}: the reduced Jacobian stays singular",
                m, rank
            );
        }

        let free_indices: Vec<usize> = (0..n_species)
            .filter(|i| !eliminated_indices.contains(i))
            .collect();

        // restriction of the invariant basis to the eliminated columns
        let b_elim = DMatrix::from_fn(rank, m, |r, c| {
            analyzer.invariants[(r, eliminated_indices[c])]
        });
        let selected_rows = select_pivot_rows(&b_elim);
        if selected_rows.len() < m {
            return Err(KineticsError::SingularElimination(format!(
                "the invariant basis restricted to {:?} has rank {} < {}, choose a different elimination set",
                eliminate,
                selected_rows.len(),
                m
            )));
        }

        let invariant_rows = DMatrix::from_fn(m, n_species, |r, c| {
            analyzer.invariants[(selected_rows[r], c)]
        });
        let v_e = DMatrix::from_fn(m, m, |r, c| invariant_rows[(r, eliminated_indices[c])]);
        let v_f = DMatrix::from_fn(m, free_indices.len(), |r, c| {
            invariant_rows[(r, free_indices[c])]
        });
        let recovery_offset = rational_invert(&v_e).ok_or_else(|| {
            KineticsError::SingularElimination(format!(
                "invariant block for eliminated species {:?} is not invertible",
                eliminate
            ))
        })?;
        let recovery_free = &recovery_offset * &v_f;
        let invariant_values = matrix_to_f64(&invariant_rows) * c0;

        let names = network.species_names();
        Ok(Self {
            free_species: free_indices.iter().map(|&i| names[i].clone()).collect(),
            free_indices,
            eliminated_species: eliminated_indices
                .iter()
                .map(|&i| names[i].clone())
                .collect(),
            eliminated_indices,
            invariant_rows,
            recovery_offset,
            recovery_free,
            invariant_values,
            initial_concentrations: c0.clone(),
            underdetermined: m < rank,
        })
    }

    pub fn n_free(&self) -> usize {
        self.free_indices.len()
    }

    pub fn invariant_rows_f64(&self) -> DMatrix<f64> {
        matrix_to_f64(&self.invariant_rows)
    }

    /// Eliminated concentrations from the current free values and the initial
    /// concentrations. The invariant values are recomputed from the supplied
    /// initial state, so the same system serves any initial condition
    /// compatible with the chosen elimination.
    pub fn recover(&self, free_values: &DVector<f64>, initial: &DVector<f64>) -> DVector<f64> {
        let b = self.invariant_rows_f64() * initial;
        matrix_to_f64(&self.recovery_offset) * b - matrix_to_f64(&self.recovery_free) * free_values
    }

    /// Full concentration vector in network species order, free values merged
    /// with recovered eliminated values.
    pub fn full_state(&self, free_values: &DVector<f64>, initial: &DVector<f64>) -> DVector<f64> {
        let eliminated = self.recover(free_values, initial);
        let n = self.free_indices.len() + self.eliminated_indices.len();
        let mut state = DVector::zeros(n);
        for (k, &i) in self.free_indices.iter().enumerate() {
            state[i] = free_values[k];
        }
        for (k, &i) in self.eliminated_indices.iter().enumerate() {
            state[i] = eliminated[k];
        }
        state
    }

    /// Closed-form expression for each eliminated species over the free
    /// species variables, invariant values baked in from the construction
    /// initial state. Pure function of the stored matrices, so repeated calls
    /// return identical expressions.
    pub fn elimination_exprs(&self) -> Vec<Expr> {
        let offset = matrix_to_f64(&self.recovery_offset) * &self.invariant_values;
        let coeffs = matrix_to_f64(&self.recovery_free);
        let mut exprs = Vec::with_capacity(self.eliminated_species.len());
        for e in 0..self.eliminated_species.len() {
            let mut expr = Expr::Const(offset[e]);
            for (f, name) in self.free_species.iter().enumerate() {
                let coefficient = coeffs[(e, f)];
                if coefficient != 0.0 {
                    expr = expr - Expr::Const(coefficient) * Expr::Var(name.clone());
                }
            }
            exprs.push(expr.symplify());
        }
        exprs
    }
}
