/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Kinetics::User_network::{
        ConcentrationConfig, Reaction, ReactionNetwork, ReactionRate, Species,
    };
    use crate::Kinetics::rate_laws::{
        EyringStruct, GibbsStruct, KineticsError, PhysicalConstants, RateLaw,
    };
    use crate::KineticsIVP::SimpleKineticIVP::KineticIVPTask;
    use crate::KineticsIVP::createRHS::{
        create_full_rhs, create_reduced_rhs, jacobian_exprs, lambdify_jacobian, lambdify_rhs,
        reaction_rate_exprs, reaction_rate_exprs_sym,
    };
    use crate::Reduction::invariant_analyzer::ConservationAnalyzer;
    use crate::Reduction::reduced_system::ReducedSystem;
    use RustedSciThe::numerical::ODE_api2::SolverType;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use std::collections::HashMap;

    fn eyring(keys: &str) -> ReactionRate {
        ReactionRate::Irreversible(RateLaw::Eyring(EyringStruct::from_keys(keys).unwrap()))
    }

    /// protein folding network: native N, unfolded U, aggregate A, ligand L,
    /// native-ligand complex NL
    fn four_state_network() -> ReactionNetwork {
        let species = vec![
            Species::new("N", &[("protein", 1)]),
            Species::new("U", &[("protein", 1)]),
            Species::new("A", &[("protein", 1)]),
            Species::new("L", &[("ligand", 1)]),
            Species::new("NL", &[("protein", 1), ("ligand", 1)]),
        ];
        let reactions = vec![
            Reaction::new(
                "unfolding",
                &[("N", 1)],
                &[("U", 1)],
                ReactionRate::Reversible {
                    forward: RateLaw::Eyring(EyringStruct::from_keys("He_u Se_u").unwrap()),
                    equilibrium: RateLaw::Gibbs(
                        GibbsStruct::from_keys("H_u S_u Cp_u Tref").unwrap(),
                    ),
                },
            ),
            Reaction::new("nucleation", &[("U", 1)], &[("A", 1)], eyring("He_n Se_n")),
            Reaction::new(
                "growth",
                &[("U", 1), ("A", 1)],
                &[("A", 2)],
                eyring("He_g Se_g"),
            ),
            Reaction::new(
                "binding",
                &[("N", 1), ("L", 1)],
                &[("NL", 1)],
                ReactionRate::Reversible {
                    forward: RateLaw::Eyring(EyringStruct::from_keys("He_b Se_b").unwrap()),
                    equilibrium: RateLaw::Gibbs(
                        GibbsStruct::from_keys("H_b S_b Cp_b Tref").unwrap(),
                    ),
                },
            ),
        ];
        ReactionNetwork::new(species, reactions).unwrap()
    }

    /// barrier heights tuned so every rate constant is between 1e-2 and 1e1
    /// at 300 K, comfortable for the solver
    fn four_state_params() -> HashMap<String, f64> {
        HashMap::from([
            ("He_u".to_string(), 80000.0),
            ("Se_u".to_string(), 0.0),
            ("H_u".to_string(), 30000.0),
            ("S_u".to_string(), 85.0),
            ("Cp_u".to_string(), 1500.0),
            ("Tref".to_string(), 298.15),
            ("He_n".to_string(), 85000.0),
            ("Se_n".to_string(), 0.0),
            ("He_g".to_string(), 74000.0),
            ("Se_g".to_string(), 0.0),
            ("He_b".to_string(), 73000.0),
            ("Se_b".to_string(), 0.0),
            ("H_b".to_string(), -40000.0),
            ("S_b".to_string(), -50.0),
            ("Cp_b".to_string(), 0.0),
            ("T".to_string(), 300.0),
        ])
    }

    fn four_state_c0(network: &ReactionNetwork) -> DVector<f64> {
        let config = ConcentrationConfig::new(&[
            ("N", 1.0),
            ("U", 0.0),
            ("A", 1e-3),
            ("L", 0.6),
            ("NL", 0.0),
        ]);
        config.build(&HashMap::new(), network).unwrap()
    }

    ///////////////////////////INVARIANT BASIS//////////////////////////////////////////////////////

    #[test]
    fn test_invariant_count_equals_rank() {
        let network = four_state_network();
        let mut analyzer = ConservationAnalyzer::from_network(&network);
        analyzer.analyze();
        assert_eq!(analyzer.rank, 2);
        assert_eq!(analyzer.invariants.nrows(), 2);
        assert_eq!(analyzer.invariants.ncols(), 5);
    }

    #[test]
    fn test_invariants_annihilate_every_reaction() {
        let network = four_state_network();
        let mut analyzer = ConservationAnalyzer::from_network(&network);
        analyzer.analyze();
        analyzer.verify_reactions(&network).unwrap();

        // the same check in floating point through the public matrices
        let v = analyzer.invariants_f64();
        for reaction in &network.reactions {
            let delta = network.stoich_change_vector(reaction);
            let product = &v * &delta;
            for k in 0..product.len() {
                assert_relative_eq!(product[k], 0.0, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let network = four_state_network();
        let mut analyzer = ConservationAnalyzer::from_network(&network);
        analyzer.analyze();
        let first = analyzer.invariants.clone();
        analyzer.analyze();
        assert_eq!(analyzer.invariants, first);
        assert_eq!(analyzer.rank, 2);
    }

    #[test]
    fn test_invariant_values_at_initial_state() {
        let network = four_state_network();
        let mut analyzer = ConservationAnalyzer::from_network(&network);
        analyzer.analyze();
        let c0 = four_state_c0(&network);
        let b = analyzer.invariant_values(&c0);
        // RREF of the composition matrix keeps the protein and ligand totals
        // as the two basis rows
        assert_eq!(b.len(), 2);
        assert_relative_eq!(b[0], 1.0 + 1e-3, epsilon = 1e-14);
        assert_relative_eq!(b[1], 0.6, epsilon = 1e-14);
    }

    ///////////////////////////ELIMINATION//////////////////////////////////////////////////////////

    #[test]
    fn test_elimination_of_l_and_n() {
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let reduced = ReducedSystem::new(&network, &["L", "N"], &c0).unwrap();
        assert_eq!(reduced.free_species, vec!["U", "A", "NL"]);
        assert!(!reduced.underdetermined);

        // round trip at t = 0: recovery from the free part of c0 returns c0
        let free0 = DVector::from_fn(3, |k, _| c0[reduced.free_indices[k]]);
        let state = reduced.full_state(&free0, &c0);
        for i in 0..c0.len() {
            assert_relative_eq!(state[i], c0[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_elimination_exprs_idempotent_and_nonempty() {
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let reduced = ReducedSystem::new(&network, &["L", "A"], &c0).unwrap();
        let first = reduced.elimination_exprs();
        let second = reduced.elimination_exprs();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_elimination_fails() {
        // N and U carry identical composition columns, no invariant pair can
        // separate them
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let result = ReducedSystem::new(&network, &["N", "U"], &c0);
        assert!(matches!(
            result,
            Err(KineticsError::SingularElimination(_))
        ));
    }

    #[test]
    fn test_eliminating_more_than_rank_fails() {
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let result = ReducedSystem::new(&network, &["L", "N", "A"], &c0);
        assert!(matches!(
            result,
            Err(KineticsError::SingularElimination(_))
        ));
    }

    #[test]
    fn test_under_elimination_is_diagnosed_not_fatal() {
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let reduced = ReducedSystem::new(&network, &["L"], &c0).unwrap();
        assert!(reduced.underdetermined);
        assert_eq!(reduced.n_free(), 4);
    }

    #[test]
    fn test_unknown_species_in_elimination_set() {
        let network = four_state_network();
        let c0 = four_state_c0(&network);
        let result = ReducedSystem::new(&network, &["L", "X"], &c0);
        assert!(matches!(result, Err(KineticsError::MalformedNetwork(_))));
    }

    ///////////////////////////JACOBIAN REGULARITY//////////////////////////////////////////////////

    fn jacobian_det_at(
        eq_system: &[RustedSciThe::symbolic::symbolic_engine::Expr],
        unknowns: &[String],
        state: &DVector<f64>,
    ) -> f64 {
        let jac = jacobian_exprs(eq_system, unknowns);
        let jac_fn = lambdify_jacobian(&jac, unknowns);
        jac_fn(0.0, state).determinant()
    }

    #[test]
    fn test_full_jacobian_is_singular() {
        let network = four_state_network();
        let params = four_state_params();
        let rates = reaction_rate_exprs(&network, &params, &PhysicalConstants::default()).unwrap();
        let (eq_system, unknowns) = create_full_rhs(&network, &rates);
        let state = DVector::from_vec(vec![0.6, 0.2, 0.1, 0.4, 0.3]);
        let det = jacobian_det_at(&eq_system, &unknowns, &state);
        assert!(det.abs() < 1e-8, "full Jacobian determinant {}", det);
    }

    #[test]
    fn test_reduced_jacobian_is_regular() {
        let network = four_state_network();
        let params = four_state_params();
        let c0 = four_state_c0(&network);
        let rates = reaction_rate_exprs(&network, &params, &PhysicalConstants::default()).unwrap();
        for eliminate in [["L", "N"], ["L", "A"], ["L", "NL"]] {
            let reduced = ReducedSystem::new(&network, &eliminate, &c0).unwrap();
            let (eq_system, unknowns) = create_reduced_rhs(&network, &reduced, &rates);
            assert_eq!(unknowns.len(), 3);
            let state = DVector::from_vec(vec![0.2, 0.1, 0.3]);
            let det = jacobian_det_at(&eq_system, &unknowns, &state);
            assert!(
                det.abs() > 1e-8,
                "reduced Jacobian for {:?} is singular, det = {}",
                eliminate,
                det
            );
        }
    }

    #[test]
    fn test_under_eliminated_jacobian_stays_singular() {
        let network = four_state_network();
        let params = four_state_params();
        let c0 = four_state_c0(&network);
        let rates = reaction_rate_exprs(&network, &params, &PhysicalConstants::default()).unwrap();
        let reduced = ReducedSystem::new(&network, &["L"], &c0).unwrap();
        let (eq_system, unknowns) = create_reduced_rhs(&network, &reduced, &rates);
        assert_eq!(unknowns.len(), 4);
        let state = DVector::from_vec(vec![0.6, 0.2, 0.1, 0.3]);
        let det = jacobian_det_at(&eq_system, &unknowns, &state);
        assert!(det.abs() < 1e-8, "determinant {}", det);
    }

    ///////////////////////////SYMBOLIC VS NUMERIC RATES////////////////////////////////////////////

    #[test]
    fn test_symbolic_rates_match_numeric_after_substitution() {
        let network = four_state_network();
        let params = four_state_params();
        let consts = PhysicalConstants::default();
        let numeric = reaction_rate_exprs(&network, &params, &consts).unwrap();
        let symbolic = reaction_rate_exprs_sym(&network, &params, &consts).unwrap();

        let state = DVector::from_vec(vec![0.6, 0.2, 0.1, 0.4, 0.3]);
        let names = network.species_names();
        let numeric_fn = lambdify_rhs(&numeric, &names);
        let values = numeric_fn(0.0, &state);

        for (j, sym) in symbolic.iter().enumerate() {
            let substituted = sym.clone().set_variable("T", 300.0).symplify();
            let f = substituted.lambdify_owned(names.iter().map(|s| s.as_str()).collect());
            let value = f(state.iter().copied().collect());
            assert_relative_eq!(value, values[j], epsilon = 1e-9 * values[j].abs().max(1e-12));
        }
    }

    ///////////////////////////TRAJECTORY PROPERTIES////////////////////////////////////////////////

    fn integrated_task(eliminate: &[&str]) -> KineticIVPTask {
        let network = four_state_network();
        let config = ConcentrationConfig::new(&[
            ("N", 1.0),
            ("U", 0.0),
            ("A", 1e-3),
            ("L", 0.6),
            ("NL", 0.0),
        ]);
        let mut task = KineticIVPTask::new(network, config, SolverType::BDF);
        task.set_parameters(four_state_params());
        task.set_time_range(0.0, 2.0);
        task.set_elimination(eliminate);
        task.setup_IVP().unwrap();
        task.solve().unwrap();
        task
    }

    #[test]
    fn test_invariants_constant_along_full_trajectory() {
        let task = integrated_task(&[]);
        let (_, full, _) = task.recover_full_trajectory().unwrap();
        // protein and ligand totals at every reported step
        for step in 0..full.nrows() {
            let protein =
                full[(step, 0)] + full[(step, 1)] + full[(step, 2)] + full[(step, 4)];
            let ligand = full[(step, 3)] + full[(step, 4)];
            assert_relative_eq!(protein, 1.0 + 1e-3, epsilon = 1e-4);
            assert_relative_eq!(ligand, 0.6, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_reduction_equivalence_across_elimination_sets() {
        let task_a = integrated_task(&["L", "N"]);
        let task_b = integrated_task(&["L", "A"]);

        let (t_a, full_a, names) = task_a.recover_full_trajectory().unwrap();
        let (t_b, full_b, _) = task_b.recover_full_trajectory().unwrap();

        // both integrations ran to the same final time
        assert_relative_eq!(t_a[t_a.len() - 1], t_b[t_b.len() - 1], epsilon = 1e-6);

        let last_a = full_a.nrows() - 1;
        let last_b = full_b.nrows() - 1;
        for i in 0..names.len() {
            assert_relative_eq!(
                full_a[(last_a, i)],
                full_b[(last_b, i)],
                epsilon = 1e-3,
                max_relative = 1e-3
            );
        }

        // recovered trajectories respect the invariants as well
        assert!(task_a.quality.max_invariant_drift_abs < 1e-6);
        assert!(task_b.quality.max_invariant_drift_abs < 1e-6);
    }
}
