//! # Thermodynamically Parameterized Rate Laws
//!
//! Rate coefficients for reaction networks computed from thermodynamic and
//! kinetic parameters:
//!
//! - **Gibbs equilibrium constant** with heat-capacity correction:
//!   `H2 = H + Cp*(T - Tref)`, `S2 = S + Cp*ln(T/Tref)`,
//!   `K = exp(-(H2 - T*S2)/(R*T))`
//! - **Eyring rate constant** from transition-state theory:
//!   `k = (k_B/h) * T * exp(-(H - T*S)/(R*T))`
//!
//! Each law binds a fixed ordered list of parameter *names*; the numeric
//! values are looked up in a caller-supplied map at evaluation time. Gas
//! constant, Boltzmann constant and Planck constant come from an explicit
//! [`PhysicalConstants`] bundle so that evaluation has no ambient state.
//!
//! Every formula is written once, generic over the [`KineticScalar`] scalar
//! abstraction, and instantiated for plain `f64` (`K_const`) and for symbolic
//! expressions (`K_expr`). The two evaluation modes therefore cannot drift
//! apart.
use RustedSciThe::symbolic::symbolic_engine::Expr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Neg, Sub};
use thiserror::Error;

/// Error type shared by the network, reduction and assembly modules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KineticsError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
    #[error("Domain error: {0}")]
    DomainError(String),
    #[error("Malformed network: {0}")]
    MalformedNetwork(String),
    #[error("Singular elimination: {0}")]
    SingularElimination(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Missing data: {0}")]
    MissingData(String),
}

/// Fundamental constants used by the rate laws, passed explicitly to every
/// evaluation. SI units throughout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Gas constant [J/(mol*K)]
    pub R: f64,
    /// Boltzmann constant [J/K]
    pub k_B: f64,
    /// Planck constant [J*s]
    pub h: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            R: 8.31446261815324,
            k_B: 1.380649e-23,
            h: 6.62607015e-34,
        }
    }
}

impl PhysicalConstants {
    pub fn new(R: f64, k_B: f64, h: f64) -> Self {
        Self { R, k_B, h }
    }
}

/// Scalar abstraction over which the rate-law formulas are written.
///
/// Implemented for `f64` and for symbolic [`Expr`]; a formula body may only
/// use the arithmetic operators plus `exp`/`ln`, so the same code path serves
/// numeric evaluation during integration and symbolic extraction for
/// inspection and differentiation.
pub trait KineticScalar:
    Sized
    + Clone
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn exp(self) -> Self;
    fn ln(self) -> Self;
}

impl KineticScalar for f64 {
    fn exp(self) -> Self {
        f64::exp(self)
    }
    fn ln(self) -> Self {
        f64::ln(self)
    }
}

impl KineticScalar for Expr {
    fn exp(self) -> Self {
        Expr::Exp(Box::new(self))
    }
    fn ln(self) -> Self {
        Expr::ln(self)
    }
}

/// K = exp(-(H2 - T*S2)/(R*T)) with H2, S2 corrected to T from Tref by Cp
pub fn gibbs_equilibrium<S: KineticScalar>(h: S, s: S, cp: S, tref: S, t: S, r: S) -> S {
    let h2 = h + cp.clone() * (t.clone() - tref.clone());
    let s2 = s + cp * S::ln(t.clone() / tref);
    S::exp(-(h2 - t.clone() * s2) / (r * t))
}

/// k = (k_B/h) * T * exp(-(H - T*S)/(R*T))
pub fn eyring_rate<S: KineticScalar>(h: S, s: S, t: S, r: S, k_b: S, h_planck: S) -> S {
    k_b / h_planck * t.clone() * S::exp(-(h - t.clone() * s) / (r * t))
}

fn fetch(params: &HashMap<String, f64>, key: &str) -> Result<f64, KineticsError> {
    params
        .get(key)
        .copied()
        .ok_or_else(|| KineticsError::MissingParameter(key.to_string()))
}

fn fetch_temperature(params: &HashMap<String, f64>) -> Result<f64, KineticsError> {
    let t = fetch(params, "T")?;
    if t <= 0.0 {
        return Err(KineticsError::DomainError(format!(
            "temperature T = {} must be positive",
            t
        )));
    }
    Ok(t)
}

/////////////////////////GIBBS EQUILIBRIUM LAW///////////////////////////////////////////////////////////

/// Equilibrium constant from a temperature dependent free energy expression.
///
/// Binds four parameter names, in order: enthalpy H [J/mol], entropy S
/// [J/(mol*K)], heat capacity change Cp [J/(mol*K)], reference temperature
/// Tref [K]. The shared key "T" is looked up in the same parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GibbsStruct {
    pub keys: Vec<String>,
}

impl GibbsStruct {
    pub fn new(keys: Vec<String>) -> Result<Self, KineticsError> {
        if keys.len() != 4 {
            return Err(KineticsError::InvalidConfiguration(format!(
                "Gibbs law requires 4 parameter keys (H, S, Cp, Tref), got {}",
                keys.len()
            )));
        }
        Ok(Self { keys })
    }
    /// shortcut constructor from a whitespace separated key list, e.g. "dH dS dCp Tref"
    pub fn from_keys(keys: &str) -> Result<Self, KineticsError> {
        Self::new(keys.split_whitespace().map(|s| s.to_string()).collect())
    }

    fn fetch_args(&self, params: &HashMap<String, f64>) -> Result<(f64, f64, f64, f64), KineticsError> {
        let h = fetch(params, &self.keys[0])?;
        let s = fetch(params, &self.keys[1])?;
        let cp = fetch(params, &self.keys[2])?;
        let tref = fetch(params, &self.keys[3])?;
        if tref <= 0.0 {
            return Err(KineticsError::DomainError(format!(
                "reference temperature {} = {} must be positive",
                self.keys[3], tref
            )));
        }
        Ok((h, s, cp, tref))
    }

    pub fn K_const(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
    ) -> Result<f64, KineticsError> {
        let (h, s, cp, tref) = self.fetch_args(params)?;
        let t = fetch_temperature(params)?;
        Ok(gibbs_equilibrium(h, s, cp, tref, t, consts.R))
    }

    /// symbolic variant: unique keys are resolved numerically, temperature stays symbolic
    pub fn K_expr(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
        T: Expr,
    ) -> Result<Expr, KineticsError> {
        let (h, s, cp, tref) = self.fetch_args(params)?;
        let k = gibbs_equilibrium(
            Expr::Const(h),
            Expr::Const(s),
            Expr::Const(cp),
            Expr::Const(tref),
            T,
            Expr::Const(consts.R),
        );
        Ok(k.symplify())
    }
}

/////////////////////////EYRING RATE LAW///////////////////////////////////////////////////////////

/// Transition state theory rate constant.
///
/// Binds two parameter names, in order: activation enthalpy H [J/mol] and
/// activation entropy S [J/(mol*K)]. The shared key "T" is looked up in the
/// same parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyringStruct {
    pub keys: Vec<String>,
}

impl EyringStruct {
    pub fn new(keys: Vec<String>) -> Result<Self, KineticsError> {
        if keys.len() != 2 {
            return Err(KineticsError::InvalidConfiguration(format!(
                "Eyring law requires 2 parameter keys (H, S), got {}",
                keys.len()
            )));
        }
        Ok(Self { keys })
    }
    pub fn from_keys(keys: &str) -> Result<Self, KineticsError> {
        Self::new(keys.split_whitespace().map(|s| s.to_string()).collect())
    }

    pub fn K_const(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
    ) -> Result<f64, KineticsError> {
        let h = fetch(params, &self.keys[0])?;
        let s = fetch(params, &self.keys[1])?;
        let t = fetch_temperature(params)?;
        Ok(eyring_rate(h, s, t, consts.R, consts.k_B, consts.h))
    }

    pub fn K_expr(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
        T: Expr,
    ) -> Result<Expr, KineticsError> {
        let h = fetch(params, &self.keys[0])?;
        let s = fetch(params, &self.keys[1])?;
        let k = eyring_rate(
            Expr::Const(h),
            Expr::Const(s),
            T,
            Expr::Const(consts.R),
            Expr::Const(consts.k_B),
            Expr::Const(consts.h),
        );
        Ok(k.symplify())
    }
}

/////////////////////////RATE LAW DISPATCH///////////////////////////////////////////////////////////

/// A named rate coefficient formula attached to a reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RateLaw {
    Gibbs(GibbsStruct),
    Eyring(EyringStruct),
}

impl RateLaw {
    /// all parameter names this law reads from the parameter map, shared key "T" included
    pub fn required_keys(&self) -> Vec<String> {
        let mut keys = match self {
            RateLaw::Gibbs(g) => g.keys.clone(),
            RateLaw::Eyring(e) => e.keys.clone(),
        };
        keys.push("T".to_string());
        keys
    }

    pub fn K_const(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
    ) -> Result<f64, KineticsError> {
        match self {
            RateLaw::Gibbs(g) => g.K_const(params, consts),
            RateLaw::Eyring(e) => e.K_const(params, consts),
        }
    }

    pub fn K_expr(
        &self,
        params: &HashMap<String, f64>,
        consts: &PhysicalConstants,
        T: Expr,
    ) -> Result<Expr, KineticsError> {
        match self {
            RateLaw::Gibbs(g) => g.K_expr(params, consts, T),
            RateLaw::Eyring(e) => e.K_expr(params, consts, T),
        }
    }
}
