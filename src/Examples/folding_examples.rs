use crate::Kinetics::User_network::{
    ConcentrationConfig, Reaction, ReactionNetwork, ReactionRate, Species,
};
use crate::Kinetics::rate_laws::{EyringStruct, GibbsStruct, PhysicalConstants, RateLaw};
use crate::KineticsIVP::SimpleKineticIVP::KineticIVPTask;
use crate::KineticsIVP::createRHS::{reaction_coefficients, reaction_rate_exprs_sym};
use crate::Reduction::invariant_analyzer::ConservationAnalyzer;
use RustedSciThe::numerical::ODE_api2::SolverType;
use std::collections::HashMap;

/// Four-state protein model: native N and unfolded U interconvert, U
/// aggregates irreversibly into A (nucleation plus autocatalytic growth), the
/// ligand L binds the native state into the complex NL. Two conserved totals:
/// protein (N + U + A + NL) and ligand (L + NL).
pub fn folding_network() -> ReactionNetwork {
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
                equilibrium: RateLaw::Gibbs(GibbsStruct::from_keys("H_u S_u Cp_u Tref").unwrap()),
            },
        ),
        Reaction::new(
            "nucleation",
            &[("U", 1)],
            &[("A", 1)],
            ReactionRate::Irreversible(RateLaw::Eyring(
                EyringStruct::from_keys("He_n Se_n").unwrap(),
            )),
        ),
        Reaction::new(
            "growth",
            &[("U", 1), ("A", 1)],
            &[("A", 2)],
            ReactionRate::Irreversible(RateLaw::Eyring(
                EyringStruct::from_keys("He_g Se_g").unwrap(),
            )),
        ),
        Reaction::new(
            "binding",
            &[("N", 1), ("L", 1)],
            &[("NL", 1)],
            ReactionRate::Reversible {
                forward: RateLaw::Eyring(EyringStruct::from_keys("He_b Se_b").unwrap()),
                equilibrium: RateLaw::Gibbs(GibbsStruct::from_keys("H_b S_b Cp_b Tref").unwrap()),
            },
        ),
    ];
    ReactionNetwork::new(species, reactions).unwrap()
}

/// unfolding thermodynamics loosely modeled on a small two-state protein,
/// binding on a micromolar-affinity ligand
pub fn folding_params() -> HashMap<String, f64> {
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
        ("T".to_string(), 310.0),
    ])
}

pub fn folding_concentrations() -> ConcentrationConfig {
    ConcentrationConfig::new(&[
        ("N", 1.0),
        ("U", 0.0),
        ("A", 1e-3),
        ("L", 0.6),
        ("NL", 0.0),
    ])
}

pub fn folding_examples(task: usize) {
    match task {
        0 => {
            // NETWORK AND CONSERVATION ANALYSIS
            let network = folding_network();
            network.pretty_print_network();

            let mut analyzer = ConservationAnalyzer::from_network(&network);
            analyzer.analyze();
            println!(
                "invariant rank: {} (components: {:?})",
                analyzer.rank, analyzer.components
            );
            println!("invariant basis:\n{}", analyzer.invariants_f64());
            analyzer.verify_reactions(&network).unwrap();
        }
        1 => {
            // RATE COEFFICIENTS, NUMERIC AND SYMBOLIC
            let network = folding_network();
            let params = folding_params();
            let consts = PhysicalConstants::default();
            let k = reaction_coefficients(&network, &params, &consts).unwrap();
            for (reaction, k_j) in network.reactions.iter().zip(k.iter()) {
                println!("k({}) = {:.4e}", reaction.name, k_j);
            }
            let sym = reaction_rate_exprs_sym(&network, &params, &consts).unwrap();
            for (reaction, rate) in network.reactions.iter().zip(sym.iter()) {
                println!("R({}) = {}", reaction.name, rate);
            }
        }
        2 => {
            // REDUCED INTEGRATION WITH RECOVERY
            let mut task = KineticIVPTask::new(
                folding_network(),
                folding_concentrations(),
                SolverType::BDF,
            );
            task.set_problem_name("protein folding with ligand binding");
            task.set_parameters(folding_params());
            task.set_overrides(HashMap::from([("L".to_string(), 0.8)]));
            task.set_elimination(&["L", "N"]);
            task.set_time_range(0.0, 50.0);
            task.setup_IVP().unwrap();
            task.pretty_print_equations();
            task.solve().unwrap();

            let (t, full, names) = task.recover_full_trajectory().unwrap();
            let last = full.nrows() - 1;
            println!("t_final = {}", t[t.len() - 1]);
            for (i, name) in names.iter().enumerate() {
                println!("[{}](t_final) = {:.6}", name, full[(last, i)]);
            }
            println!(
                "max invariant drift: {:.3e}",
                task.quality.max_invariant_drift_abs
            );
        }
        _ => {
            println!("no such task");
        }
    }
}
