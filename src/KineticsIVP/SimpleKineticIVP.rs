//! # Kinetic Initial Value Problem Task
//!
//! This module wires a reaction network into the external ODE machinery. It
//! handles the complete workflow from network data to an integrated,
//! reconstructed trajectory:
//! 1. Concentration configuration (defaults merged with explicit overrides)
//! 2. Rate coefficient evaluation and symbolic rate assembly
//! 3. Conservation-law reduction of the differential variables
//! 4. Delegation to the external solver
//! 5. Post-processing: recovery of the eliminated species and an invariant
//!    drift report over the computed trajectory
//!
//! The solver itself is an external dependency; this module only produces the
//! symbolic system and the initial state the solver consumes.
//!
//! ## Usage Pattern
//! 1. `new()` with the network, concentration defaults and solver type
//! 2. setters for parameters, overrides, elimination set and time range
//! 3. `setup_IVP()` to validate and assemble the system
//! 4. `solve()` to integrate
//! 5. `get_result()` / `recover_full_trajectory()` / `quality`
use crate::Kinetics::User_network::{ConcentrationConfig, ReactionNetwork};
use crate::Kinetics::rate_laws::{KineticsError, PhysicalConstants};
use crate::KineticsIVP::createRHS::{
    create_full_rhs, create_reduced_rhs, jacobian_exprs, lambdify_jacobian, lambdify_rhs,
    reaction_rate_exprs,
};
use crate::Reduction::reduced_system::ReducedSystem;
use RustedSciThe::numerical::ODE_api2::{SolverParam, SolverType, UniversalODESolver};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::info;
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// Trajectory health indicators filled after a solve.
#[derive(Debug, Clone)]
pub struct SolutionQuality {
    /// largest absolute drift of any invariant over the trajectory
    pub max_invariant_drift_abs: f64,
    /// drift relative to the invariant value at the initial state
    pub max_invariant_drift_rel: f64,
    /// steps where some concentration went negative beyond threshold
    pub negative_concentrations: Vec<(usize, f64)>,
}

impl Default for SolutionQuality {
    fn default() -> Self {
        Self {
            max_invariant_drift_abs: 0.0,
            max_invariant_drift_rel: 0.0,
            negative_concentrations: Vec::new(),
        }
    }
}

/// Main task structure aggregating the network, physical parameters,
/// configuration and solver state.
pub struct KineticIVPTask {
    /// Optional problem identifier
    pub problem_name: Option<String>,
    pub problem_description: Option<String>,
    pub network: ReactionNetwork,
    /// parameter map: rate-law parameter values plus the shared key "T"
    pub params: HashMap<String, f64>,
    pub constants: PhysicalConstants,
    /// default initial concentrations for every species
    pub concentrations: ConcentrationConfig,
    /// explicit overrides applied on top of the defaults
    pub overrides: HashMap<String, f64>,
    /// species to eliminate through conservation laws; empty means the full
    /// system is integrated as is
    pub eliminate: Vec<String>,
    pub t0: f64,
    pub t_final: f64,
    pub solvertype: SolverType,
    pub solver_params: HashMap<String, SolverParam>,
    /// initial concentration vector in network order, filled by setup
    pub c0: Option<DVector<f64>>,
    pub reduced: Option<ReducedSystem>,
    /// per-reaction symbolic rates with numeric coefficients
    pub rate_exprs: Vec<Expr>,
    /// assembled balance equations handed to the solver
    pub eq_system: Vec<Expr>,
    pub unknowns: Vec<String>,
    solver: Option<UniversalODESolver>,
    pub quality: SolutionQuality,
}

impl KineticIVPTask {
    pub fn new(
        network: ReactionNetwork,
        concentrations: ConcentrationConfig,
        solvertype: SolverType,
    ) -> Self {
        let solver_params = HashMap::from([
            ("step_size".to_owned(), SolverParam::Float(1e-3)),
            ("tolerance".to_owned(), SolverParam::Float(1e-6)),
            ("max_iterations".to_owned(), SolverParam::Int(100000)),
            ("rtol".to_owned(), SolverParam::Float(1e-6)),
            ("atol".to_owned(), SolverParam::Float(1e-8)),
            ("max_step".to_owned(), SolverParam::Float(0.1)),
            ("first_step".to_owned(), SolverParam::OptionalFloat(None)),
            ("vectorized".to_owned(), SolverParam::Bool(false)),
            ("jac_sparsity".to_owned(), SolverParam::OptionalMatrix(None)),
            ("parallel".to_owned(), SolverParam::Bool(false)),
        ]);
        Self {
            problem_name: None,
            problem_description: None,
            network,
            params: HashMap::new(),
            constants: PhysicalConstants::default(),
            concentrations,
            overrides: HashMap::new(),
            eliminate: Vec::new(),
            t0: 0.0,
            t_final: 0.0,
            solvertype,
            solver_params,
            c0: None,
            reduced: None,
            rate_exprs: Vec::new(),
            eq_system: Vec::new(),
            unknowns: Vec::new(),
            solver: None,
            quality: SolutionQuality::default(),
        }
    }

    /////////////////////////////////SETTERS////////////////////////////////////////////////////////

    pub fn set_problem_name(&mut self, name: &str) {
        self.problem_name = Some(name.to_string());
    }

    pub fn set_problem_description(&mut self, description: &str) {
        self.problem_description = Some(description.to_string());
    }

    pub fn set_parameters(&mut self, params: HashMap<String, f64>) {
        self.params = params;
    }

    pub fn set_constants(&mut self, constants: PhysicalConstants) {
        self.constants = constants;
    }

    pub fn set_overrides(&mut self, overrides: HashMap<String, f64>) {
        self.overrides = overrides;
    }

    pub fn set_elimination(&mut self, eliminate: &[&str]) {
        self.eliminate = eliminate.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_time_range(&mut self, t0: f64, t_final: f64) {
        self.t0 = t0;
        self.t_final = t_final;
    }

    pub fn set_solver_params(&mut self, params: HashMap<String, SolverParam>) {
        self.solver_params = params;
    }

    ///////////////////////////////////////////VALIDATION////////////////////////////////////////////////

    /// Validate the task configuration before assembly.
    pub fn check_task(&self) -> Result<(), KineticsError> {
        if self.t_final <= self.t0 {
            return Err(KineticsError::InvalidConfiguration(format!(
                "t_final {} must be greater than t0 {}",
                self.t_final, self.t0
            )));
        }
        if self.network.reactions.is_empty() {
            return Err(KineticsError::MissingData(
                "network contains no reactions".to_string(),
            ));
        }
        self.network.validate_rate_params(&self.params)?;
        let t = self
            .params
            .get("T")
            .copied()
            .ok_or_else(|| KineticsError::MissingParameter("T".to_string()))?;
        if t <= 0.0 {
            return Err(KineticsError::DomainError(format!(
                "temperature T = {} must be positive",
                t
            )));
        }
        Ok(())
    }

    ///////////////////////////////////////////SETUP////////////////////////////////////////////////

    /// Complete setup workflow: validation, initial state, rate assembly,
    /// reduction, equation system.
    pub fn setup_IVP(&mut self) -> Result<(), KineticsError> {
        self.check_task()?;
        info!("task checked!");

        let c0 = self.concentrations.build(&self.overrides, &self.network)?;
        info!("initial concentrations assembled");

        self.rate_exprs = reaction_rate_exprs(&self.network, &self.params, &self.constants)?;
        info!("reaction rates assembled");

        if self.eliminate.is_empty() {
            let (eq_system, unknowns) = create_full_rhs(&self.network, &self.rate_exprs);
            self.eq_system = eq_system;
            self.unknowns = unknowns;
            self.reduced = None;
        } else {
            let eliminate: Vec<&str> = self.eliminate.iter().map(|s| s.as_str()).collect();
            let reduced = ReducedSystem::new(&self.network, &eliminate, &c0)?;
            let (eq_system, unknowns) =
                create_reduced_rhs(&self.network, &reduced, &self.rate_exprs);
            self.eq_system = eq_system;
            self.unknowns = unknowns;
            self.reduced = Some(reduced);
        }
        info!("equation system created");

        self.c0 = Some(c0);
        Ok(())
    }

    /// initial values of the integrated unknowns (free species when reduced)
    pub fn y0(&self) -> Result<DVector<f64>, KineticsError> {
        let c0 = self
            .c0
            .as_ref()
            .ok_or_else(|| KineticsError::MissingData("setup_IVP not called".to_string()))?;
        match &self.reduced {
            Some(reduced) => Ok(DVector::from_fn(reduced.free_indices.len(), |k, _| {
                c0[reduced.free_indices[k]]
            })),
            None => Ok(c0.clone()),
        }
    }

    ///////////////////////////////////////////SOLVING////////////////////////////////////////////////

    pub fn solve(&mut self) -> Result<(), KineticsError> {
        if self.eq_system.is_empty() {
            return Err(KineticsError::MissingData(
                "equation system not assembled, call setup_IVP first".to_string(),
            ));
        }
        let y0 = self.y0()?;
        let mut ode = UniversalODESolver::new(
            self.eq_system.clone(),
            self.unknowns.clone(),
            "t".to_owned(),
            self.solvertype.clone(),
            self.t0,
            y0,
            self.t_final,
        );
        ode.set_parameters(self.solver_params.clone());
        ode.initialize();
        ode.solve();
        self.solver = Some(ode);
        info!("IVP solved");
        self.estimate_quality()?;
        Ok(())
    }

    /// raw solver output: time mesh and solution matrix, columns in unknown order
    pub fn get_result(&self) -> (Option<DVector<f64>>, Option<DMatrix<f64>>) {
        match &self.solver {
            Some(ode) => ode.get_result(),
            None => (None, None),
        }
    }

    ///////////////////////////////////////////POST-PROCESSING////////////////////////////////////////

    /// Full trajectory over all network species, eliminated concentrations
    /// recovered from the invariants. Columns are in network species order.
    pub fn recover_full_trajectory(
        &self,
    ) -> Result<(DVector<f64>, DMatrix<f64>, Vec<String>), KineticsError> {
        let (t, y) = self.get_result();
        let t = t.ok_or_else(|| {
            KineticsError::MissingData("no solution available, call solve first".to_string())
        })?;
        let y = y.ok_or_else(|| {
            KineticsError::MissingData("no solution available, call solve first".to_string())
        })?;
        let names = self.network.species_names();
        match &self.reduced {
            None => Ok((t, y, names)),
            Some(reduced) => {
                let c0 = self
                    .c0
                    .as_ref()
                    .ok_or_else(|| KineticsError::MissingData("setup_IVP not called".to_string()))?;
                let n_steps = y.nrows();
                let mut full = DMatrix::zeros(n_steps, names.len());
                for step in 0..n_steps {
                    let free = DVector::from_fn(y.ncols(), |k, _| y[(step, k)]);
                    let state = reduced.full_state(&free, c0);
                    for i in 0..names.len() {
                        full[(step, i)] = state[i];
                    }
                }
                Ok((t, full, names))
            }
        }
    }

    /// Invariant drift and negativity report over the computed trajectory.
    pub fn estimate_quality(&mut self) -> Result<(), KineticsError> {
        let (_, full, _) = self.recover_full_trajectory()?;
        let c0 = self
            .c0
            .as_ref()
            .ok_or_else(|| KineticsError::MissingData("setup_IVP not called".to_string()))?;
        let mut analyzer =
            crate::Reduction::invariant_analyzer::ConservationAnalyzer::from_network(&self.network);
        analyzer.analyze();
        let b0 = analyzer.invariant_values(c0);
        let invariants = analyzer.invariants_f64();

        let mut quality = SolutionQuality::default();
        for step in 0..full.nrows() {
            let state = DVector::from_fn(full.ncols(), |i, _| full[(step, i)]);
            let b = &invariants * &state;
            for k in 0..b.len() {
                let drift = (b[k] - b0[k]).abs();
                if drift > quality.max_invariant_drift_abs {
                    quality.max_invariant_drift_abs = drift;
                    quality.max_invariant_drift_rel = if b0[k].abs() > 0.0 {
                        drift / b0[k].abs()
                    } else {
                        drift
                    };
                }
            }
            for i in 0..state.len() {
                if state[i] < -1e-8 {
                    quality.negative_concentrations.push((step, state[i]));
                }
            }
        }
        self.quality = quality;
        Ok(())
    }

    ///////////////////////////////////////////EXTERNAL CALLABLES////////////////////////////////////

    /// right-hand-side closure over the assembled unknown ordering
    pub fn rhs_fn(&self) -> Box<dyn Fn(f64, &DVector<f64>) -> DVector<f64>> {
        lambdify_rhs(&self.eq_system, &self.unknowns)
    }

    /// Jacobian closure matching [`Self::rhs_fn`]
    pub fn jacobian_fn(&self) -> Box<dyn Fn(f64, &DVector<f64>) -> DMatrix<f64>> {
        let jacobian = jacobian_exprs(&self.eq_system, &self.unknowns);
        lambdify_jacobian(&jacobian, &self.unknowns)
    }

    pub fn pretty_print_equations(&self) {
        for (name, eq) in self.unknowns.iter().zip(self.eq_system.iter()) {
            println!("d[{}]/dt = {}", name, eq);
        }
    }
}
