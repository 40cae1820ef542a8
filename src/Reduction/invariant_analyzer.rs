use crate::Kinetics::User_network::ReactionNetwork;
use crate::Kinetics::rate_laws::KineticsError;
use nalgebra::{DMatrix, DVector};
use num_rational::Rational64;
use num_traits::Zero;

/// Reduced row echelon form of a rational matrix, returned together with the
/// rank. Gauss-Jordan with exact arithmetic, pivots normalized to 1.
pub fn rational_rref(mut m: DMatrix<Rational64>) -> (DMatrix<Rational64>, usize) {
    let (nrows, ncols) = m.shape();
    let mut pivot_row = 0usize;
    for col in 0..ncols {
        if pivot_row >= nrows {
            break;
        }
        let mut pivot = None;
        for r in pivot_row..nrows {
            if !m[(r, col)].is_zero() {
                pivot = Some(r);
                break;
            }
        }
        let pivot = match pivot {
            Some(r) => r,
            None => continue,
        };
        m.swap_rows(pivot_row, pivot);
        let p = m[(pivot_row, col)];
        for c in col..ncols {
            m[(pivot_row, c)] = m[(pivot_row, c)] / p;
        }
        for r in 0..nrows {
            if r != pivot_row && !m[(r, col)].is_zero() {
                let factor = m[(r, col)];
                for c in col..ncols {
                    let v = m[(pivot_row, c)] * factor;
                    m[(r, c)] = m[(r, c)] - v;
                }
            }
        }
        pivot_row += 1;
    }
    (m, pivot_row)
}

/// Computes the linear conservation laws of a reaction network.
///
/// Usage mirrors the other analyzer structs of the crate: construct from a
/// network, call `analyze`, then read the results off the struct.
#[derive(Debug, Clone)]
pub struct ConservationAnalyzer {
    /// species names in network order, define the invariant vector indexing
    pub species: Vec<String>,
    /// component names in first-appearance order
    pub components: Vec<String>,
    /// composition matrix, components x species, exact integer entries
    pub composition: DMatrix<Rational64>,
    /// invariant basis, one row per independent conservation law
    pub invariants: DMatrix<Rational64>,
    /// rank of the composition matrix
    pub rank: usize,
}

impl ConservationAnalyzer {
    pub fn from_network(network: &ReactionNetwork) -> Self {
        Self {
            species: network.species_names(),
            components: network.components.clone(),
            composition: network.composition_matrix_rational(),
            invariants: DMatrix::zeros(0, network.species.len()),
            rank: 0,
        }
    }

    /// Extracts the invariant basis as the nonzero rows of the reduced row
    /// echelon form of the composition matrix. Idempotent: repeated calls
    /// recompute the same basis from the same composition.
    pub fn analyze(&mut self) {
        let (rref, rank) = rational_rref(self.composition.clone());
        let ncols = self.composition.ncols();
        let mut basis = DMatrix::zeros(rank, ncols);
        for r in 0..rank {
            for c in 0..ncols {
                basis[(r, c)] = rref[(r, c)];
            }
        }
        self.invariants = basis;
        self.rank = rank;
    }

    pub fn invariants_f64(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.invariants.nrows(), self.invariants.ncols(), |i, j| {
            *self.invariants[(i, j)].numer() as f64 / *self.invariants[(i, j)].denom() as f64
        })
    }

    /// invariant values b = V * c0, constant along any trajectory started at c0
    pub fn invariant_values(&self, c0: &DVector<f64>) -> DVector<f64> {
        self.invariants_f64() * c0
    }

    /// Exact check that every invariant annihilates every reaction's
    /// stoichiometric change vector, v * delta = 0.
    pub fn verify_reactions(&self, network: &ReactionNetwork) -> Result<(), KineticsError> {
        for reaction in &network.reactions {
            let delta = network.stoich_change_rational(reaction);
            for r in 0..self.invariants.nrows() {
                let mut dot = Rational64::zero();
                for c in 0..self.invariants.ncols() {
                    dot += self.invariants[(r, c)] * delta[c];
                }
                if !dot.is_zero() {
                    return Err(KineticsError::MalformedNetwork(format!(
                        "invariant {} is not conserved by reaction '{}'",
                        r, reaction.name
                    )));
                }
            }
        }
        Ok(())
    }
}
