use crate::core::forcefield::grid::ReceptorGrids;
use crate::core::forcefield::potentials::PairPotentials;
use crate::core::models::ligand::{Conformation, Ligand};
use crate::engine::config::DockingConfig;
use crate::engine::error::EngineError;
use crate::engine::optimize::run_trial;
use crate::engine::progress::{Progress, ProgressReporter};
use rayon::prelude::*;
use tracing::{info, instrument};

/// Outcome of a docking run: trial results merged and ranked by energy,
/// truncated to the configured solution count.
#[derive(Debug, Clone)]
pub struct DockingResult {
    pub solutions: Vec<Conformation>,
}

/// Runs the full docking workflow: validates inputs, fans the configured
/// number of independent trials out across the thread pool, and collects
/// each trial's best conformation into a ranked result set.
///
/// Trial `i` is seeded with `config.seed.wrapping_add(i)`, so the whole run
/// is reproducible from the single configured seed regardless of how trials
/// are scheduled.
#[instrument(skip_all, name = "docking_workflow")]
pub fn run(
    ligand: &Ligand,
    potentials: &PairPotentials,
    grids: &ReceptorGrids,
    config: &DockingConfig,
    reporter: &ProgressReporter,
) -> Result<DockingResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    config.validate()?;
    validate_grid_coverage(ligand, grids)?;
    info!(
        num_trials = config.num_trials,
        num_generations = config.num_generations,
        heavy_atoms = ligand.heavy_atoms().len(),
        active_torsions = ligand.num_active_torsions(),
        "Starting docking run."
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Docking Trials",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.num_trials as u64,
    });

    let mut solutions: Vec<Conformation> = (0..config.num_trials)
        .into_par_iter()
        .map(|trial| {
            let seed = config.seed.wrapping_add(trial as u64);
            let best = run_trial(ligand, potentials, grids, seed, config.num_generations);
            reporter.report(Progress::TaskIncrement);
            best
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    solutions.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    solutions.truncate(config.num_solutions);

    info!(
        num_solutions = solutions.len(),
        best_energy = solutions.first().map(|s| s.energy),
        "Docking run complete."
    );
    Ok(DockingResult { solutions })
}

/// Every heavy atom needs a receptor map for its type before any trial runs.
fn validate_grid_coverage(ligand: &Ligand, grids: &ReceptorGrids) -> Result<(), EngineError> {
    for atom in ligand.heavy_atoms() {
        let type_index = atom.atom_type.grid_index();
        if !grids.has_map(type_index) {
            return Err(EngineError::MissingGridMap { type_index });
        }
    }
    Ok(())
}
