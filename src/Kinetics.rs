/// Thermodynamically parameterized rate coefficients: Gibbs equilibrium
/// constants with heat-capacity correction and Eyring transition-state rate
/// constants. Formulas are generic over a scalar abstraction so numeric and
/// symbolic evaluation share one code path.
///
/// # Examples
/// ```
/// use KiRed::Kinetics::rate_laws::{EyringStruct, PhysicalConstants};
/// use std::collections::HashMap;
/// let law = EyringStruct::from_keys("He Se").unwrap();
/// let params = HashMap::from([
///     ("He".to_string(), 80000.0),
///     ("Se".to_string(), 10.0),
///     ("T".to_string(), 300.0),
/// ]);
/// let k = law.K_const(&params, &PhysicalConstants::default()).unwrap();
/// println!("k = {}", k);
/// ```
pub mod rate_laws;
/// eng
/// Reaction network data model. The module takes a vector of species and a
/// vector of reactions and produces the following data:
/// 1) a composition matrix (components x species) and the component list
/// 2) a stoichiometric matrix (reactions x species) of net coefficients
/// 3) per-reaction stoichiometric change vectors
/// Mass conservation is checked for every reaction at construction, catalytic
/// species cancel in the stoichiometry but enter the rate expressions.
/// Also contains the initial-concentration configuration with explicit
/// default/override merge semantics.
#[allow(non_snake_case)]
pub mod User_network;
