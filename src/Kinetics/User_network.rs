//! # Reaction Network Data Model
//!
//! THE STRUCT ReactionNetwork COLLECTS SPECIES AND REACTIONS AND PRODUCES THE
//! MATRICES NEEDED FOR FURTHER CALCULATIONS:
//!
//! 1) composition matrix: rows are conserved structural components (e.g.
//!    "protein", "ligand"), columns are species in insertion order
//! 2) stoichiometric matrix: rows are reactions, columns are species, entries
//!    are net coefficients (products minus reactants)
//! 3) per-reaction stoichiometric change vectors
//!
//! Mass conservation is enforced when the network is constructed: a reaction
//! whose reactant-side composition differs from its product-side composition
//! is rejected with `MalformedNetwork`. Catalytic species appear unchanged on
//! both sides, enter the rate expression and cancel in the stoichiometry.
use crate::Kinetics::rate_laws::{KineticsError, RateLaw};
use nalgebra::{DMatrix, DVector};
use num_rational::Rational64;
use num_traits::Zero;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

/// A chemical species with its structural composition.
///
/// The composition maps component names to non-negative counts and is the
/// only information used to build conservation laws. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub composition: HashMap<String, usize>,
}

impl Species {
    pub fn new(name: &str, composition: &[(&str, usize)]) -> Self {
        Self {
            name: name.to_string(),
            composition: composition
                .iter()
                .map(|(c, n)| (c.to_string(), *n))
                .collect(),
        }
    }
}

/// How a reaction's rate coefficient is obtained.
///
/// A reversible reaction carries a forward law and a Gibbs equilibrium law;
/// the backward coefficient is forward divided by the equilibrium constant,
/// so the pair relaxes to the thermodynamically consistent equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReactionRate {
    Irreversible(RateLaw),
    Reversible {
        forward: RateLaw,
        equilibrium: RateLaw,
    },
}

impl ReactionRate {
    pub fn required_keys(&self) -> Vec<String> {
        match self {
            ReactionRate::Irreversible(law) => law.required_keys(),
            ReactionRate::Reversible {
                forward,
                equilibrium,
            } => {
                let mut keys = forward.required_keys();
                for k in equilibrium.required_keys() {
                    if !keys.contains(&k) {
                        keys.push(k);
                    }
                }
                keys
            }
        }
    }
}

/// An elementary reaction step: reactant and product multisets plus optional
/// catalytic species present unchanged on both sides. Owned by the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    /// (species name, multiplicity)
    pub reactants: Vec<(String, usize)>,
    pub products: Vec<(String, usize)>,
    pub catalysts: Vec<(String, usize)>,
    pub rate: ReactionRate,
}

impl Reaction {
    pub fn new(
        name: &str,
        reactants: &[(&str, usize)],
        products: &[(&str, usize)],
        rate: ReactionRate,
    ) -> Self {
        let to_owned = |side: &[(&str, usize)]| {
            side.iter()
                .map(|(s, n)| (s.to_string(), *n))
                .collect::<Vec<_>>()
        };
        Self {
            name: name.to_string(),
            reactants: to_owned(reactants),
            products: to_owned(products),
            catalysts: Vec::new(),
            rate,
        }
    }

    pub fn with_catalysts(mut self, catalysts: &[(&str, usize)]) -> Self {
        self.catalysts = catalysts
            .iter()
            .map(|(s, n)| (s.to_string(), *n))
            .collect();
        self
    }

    fn each_side(&self) -> [&Vec<(String, usize)>; 3] {
        [&self.reactants, &self.products, &self.catalysts]
    }
}

/// Ordered collection of species and reactions.
///
/// Species insertion order defines the column indexing of every matrix and
/// vector produced from the network; component order is first appearance
/// across the species list.
#[derive(Debug, Clone)]
pub struct ReactionNetwork {
    pub species: Vec<Species>,
    pub components: Vec<String>,
    pub reactions: Vec<Reaction>,
    species_index: HashMap<String, usize>,
}

impl ReactionNetwork {
    pub fn new(species: Vec<Species>, reactions: Vec<Reaction>) -> Result<Self, KineticsError> {
        let mut species_index: HashMap<String, usize> = HashMap::new();
        for (i, sp) in species.iter().enumerate() {
            if species_index.insert(sp.name.clone(), i).is_some() {
                return Err(KineticsError::MalformedNetwork(format!(
                    "duplicate species '{}'",
                    sp.name
                )));
            }
        }
        // components in first-appearance order so output indexing is stable
        let mut components: Vec<String> = Vec::new();
        for sp in species.iter() {
            let mut names: Vec<&String> = sp.composition.keys().collect();
            names.sort();
            for name in names {
                if !components.contains(name) {
                    components.push(name.clone());
                }
            }
        }
        let network = Self {
            species,
            components,
            reactions,
            species_index,
        };
        network.check_reactions()?;
        Ok(network)
    }

    /// every referenced species must exist and every reaction must conserve composition
    fn check_reactions(&self) -> Result<(), KineticsError> {
        for reaction in &self.reactions {
            for side in reaction.each_side() {
                for (name, _) in side.iter() {
                    if !self.species_index.contains_key(name) {
                        return Err(KineticsError::MalformedNetwork(format!(
                            "reaction '{}' references unknown species '{}'",
                            reaction.name, name
                        )));
                    }
                }
            }
            let balance = |side: &[(String, usize)]| {
                let mut totals: HashMap<String, i64> = HashMap::new();
                for (name, mult) in side.iter() {
                    let sp = &self.species[self.species_index[name]];
                    for (component, count) in sp.composition.iter() {
                        *totals.entry(component.clone()).or_insert(0) +=
                            (*count as i64) * (*mult as i64);
                    }
                }
                totals
            };
            let lhs = balance(&reaction.reactants);
            let rhs = balance(&reaction.products);
            for component in self.components.iter() {
                let l = lhs.get(component).copied().unwrap_or(0);
                let r = rhs.get(component).copied().unwrap_or(0);
                if l != r {
                    return Err(KineticsError::MalformedNetwork(format!(
                        "reaction '{}' does not conserve component '{}': {} -> {}",
                        reaction.name, component, l, r
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn species_names(&self) -> Vec<String> {
        self.species.iter().map(|s| s.name.clone()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.species_index.get(name).copied()
    }

    /////////////////////////////////MATRICES///////////////////////////////////////////

    /// Composition matrix and component names, rows are components and
    /// columns are species in network order. Diagnostic interface, not used
    /// by the integration path itself.
    pub fn composition_matrix(&self) -> (DMatrix<f64>, Vec<String>) {
        let a = self.composition_matrix_rational();
        let a_f64 = DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| {
            *a[(i, j)].numer() as f64 / *a[(i, j)].denom() as f64
        });
        (a_f64, self.components.clone())
    }

    /// exact integer entries for conservation analysis
    pub fn composition_matrix_rational(&self) -> DMatrix<Rational64> {
        let nrows = self.components.len();
        let ncols = self.species.len();
        DMatrix::from_fn(nrows, ncols, |i, j| {
            let count = self.species[j]
                .composition
                .get(&self.components[i])
                .copied()
                .unwrap_or(0);
            Rational64::from_integer(count as i64)
        })
    }

    /// net stoichiometric coefficients of one reaction over the species order
    pub fn stoich_change_rational(&self, reaction: &Reaction) -> DVector<Rational64> {
        let mut delta = DVector::from_element(self.species.len(), Rational64::zero());
        for (name, mult) in reaction.products.iter() {
            let i = self.species_index[name];
            delta[i] += Rational64::from_integer(*mult as i64);
        }
        for (name, mult) in reaction.reactants.iter() {
            let i = self.species_index[name];
            delta[i] -= Rational64::from_integer(*mult as i64);
        }
        delta
    }

    pub fn stoich_change_vector(&self, reaction: &Reaction) -> DVector<f64> {
        let delta = self.stoich_change_rational(reaction);
        DVector::from_fn(delta.len(), |i, _| {
            *delta[i].numer() as f64 / *delta[i].denom() as f64
        })
    }

    /// matrix of net stoichiometric coefficients, rows are reactions
    pub fn stoich_matrix(&self) -> DMatrix<f64> {
        let nrows = self.reactions.len();
        let ncols = self.species.len();
        let mut matrix = DMatrix::zeros(nrows, ncols);
        for (j, reaction) in self.reactions.iter().enumerate() {
            let delta = self.stoich_change_vector(reaction);
            for i in 0..ncols {
                matrix[(j, i)] = delta[i];
            }
        }
        matrix
    }

    /// check that the supplied parameter map covers every rate law of the network
    pub fn validate_rate_params(&self, params: &HashMap<String, f64>) -> Result<(), KineticsError> {
        for reaction in &self.reactions {
            for key in reaction.rate.required_keys() {
                if !params.contains_key(&key) {
                    return Err(KineticsError::MissingParameter(format!(
                        "{} (required by reaction '{}')",
                        key, reaction.name
                    )));
                }
            }
        }
        Ok(())
    }

    ///////////////////////////INPUT/OUTPUT/////////////////////////////////////////////////////////

    pub fn pretty_print_network(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("reaction"),
            Cell::new("reactants"),
            Cell::new("products"),
            Cell::new("catalysts"),
        ]));
        let side_str = |side: &Vec<(String, usize)>| {
            side.iter()
                .map(|(s, n)| {
                    if *n == 1 {
                        s.clone()
                    } else {
                        format!("{} {}", n, s)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        for reaction in &self.reactions {
            table.add_row(Row::new(vec![
                Cell::new(&reaction.name),
                Cell::new(&side_str(&reaction.reactants)),
                Cell::new(&side_str(&reaction.products)),
                Cell::new(&side_str(&reaction.catalysts)),
            ]));
        }
        table.printstd();

        let mut comp_table = Table::new();
        let mut header = vec![Cell::new("component")];
        header.extend(self.species.iter().map(|s| Cell::new(&s.name)));
        comp_table.add_row(Row::new(header));
        let (a, components) = self.composition_matrix();
        for (i, component) in components.iter().enumerate() {
            let mut row = vec![Cell::new(component)];
            for j in 0..a.ncols() {
                row.push(Cell::new(&format!("{}", a[(i, j)])));
            }
            comp_table.add_row(Row::new(row));
        }
        comp_table.printstd();
    }

    pub fn network_json(&self) -> Value {
        json!({
            "species": self.species,
            "components": self.components,
            "reactions": self.reactions,
        })
    }

    /// write the network skeleton to a JSON file
    pub fn save_network_json(&self, path: &str) -> Result<(), std::io::Error> {
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(&self.network_json())?.as_bytes())?;
        Ok(())
    }
}

/////////////////////////////////INITIAL CONCENTRATIONS///////////////////////////////////////////

/// Default initial concentrations with explicit override semantics.
///
/// The defaults enumerate every recognized species; `build` replaces listed
/// entries with override values, keeps unlisted defaults and rejects unknown
/// keys instead of silently ignoring them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationConfig {
    pub defaults: Vec<(String, f64)>,
}

impl ConcentrationConfig {
    pub fn new(defaults: &[(&str, f64)]) -> Self {
        Self {
            defaults: defaults
                .iter()
                .map(|(s, v)| (s.to_string(), *v))
                .collect(),
        }
    }

    /// initial concentration vector in network species order
    pub fn build(
        &self,
        overrides: &HashMap<String, f64>,
        network: &ReactionNetwork,
    ) -> Result<DVector<f64>, KineticsError> {
        for key in overrides.keys() {
            if network.index_of(key).is_none() {
                return Err(KineticsError::InvalidConfiguration(format!(
                    "unknown species '{}' in concentration overrides",
                    key
                )));
            }
        }
        let default_map: HashMap<&str, f64> = self
            .defaults
            .iter()
            .map(|(s, v)| (s.as_str(), *v))
            .collect();
        let mut c0 = DVector::zeros(network.species.len());
        for (i, sp) in network.species.iter().enumerate() {
            let value = overrides
                .get(&sp.name)
                .copied()
                .or_else(|| default_map.get(sp.name.as_str()).copied())
                .ok_or_else(|| {
                    KineticsError::MissingData(format!(
                        "no default or override concentration for species '{}'",
                        sp.name
                    ))
                })?;
            if value < 0.0 {
                return Err(KineticsError::InvalidConfiguration(format!(
                    "negative concentration {} for species '{}'",
                    value, sp.name
                )));
            }
            c0[i] = value;
        }
        Ok(c0)
    }
}
