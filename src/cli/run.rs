//! Handler for the `run` command.

use tabled::{Table, Tabled};
use tracing::info;

use crate::adapter::solver::HiGHSSolver;
use crate::application::experiment::{Experiment, ExperimentReport, MechanismStats};
use crate::cli::{output, RunArgs};
use crate::error::Result;

#[derive(Tabled)]
struct MechanismRow {
    #[tabled(rename = "Mechanism")]
    mechanism: String,
    #[tabled(rename = "Computed")]
    computed: u64,
    #[tabled(rename = "VCG in core")]
    vcg_in_core: u64,
    #[tabled(rename = "Empty core")]
    empty_core: String,
    #[tabled(rename = "Not converged")]
    non_convergent: u64,
    #[tabled(rename = "Mean revenue")]
    revenue: String,
    #[tabled(rename = "Mean rounds")]
    rounds: String,
}

impl From<&MechanismStats> for MechanismRow {
    fn from(stats: &MechanismStats) -> Self {
        Self {
            mechanism: stats.mechanism.to_string(),
            computed: stats.computed,
            vcg_in_core: stats.vcg_in_core,
            empty_core: format!("{} ({} fallback)", stats.empty_core, stats.fallbacks),
            non_convergent: stats.non_convergent,
            revenue: format!("{:.4}", stats.mean_revenue()),
            rounds: format!("{:.2}", stats.mean_iterations()),
        }
    }
}

/// Execute the run command.
///
/// # Errors
///
/// Returns configuration errors and the first unexpected error of the
/// experiment.
pub fn execute(args: &RunArgs) -> Result<()> {
    let mut config = args.config.load()?;

    if let Some(trials) = args.trials {
        config.experiment.trials = trials;
    }
    if let Some(seed) = args.seed {
        config.experiment.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.experiment.workers = Some(workers);
    }
    if let Some(mechanisms) = &args.mechanisms {
        config.experiment.mechanisms.clone_from(mechanisms);
    }
    args.log.apply(&mut config.logging, output::verbosity());
    config.validate()?;
    config.init_logging();

    output::header(env!("CARGO_PKG_VERSION"));
    info!(
        trials = config.experiment.trials,
        seed = config.experiment.seed,
        "Experiment configured"
    );

    let trials = config.experiment.trials;
    let experiment = Experiment::new(config.experiment, config.core);
    let pb = output::spinner(&format!("Running {trials} trials"));
    let report = match experiment.run(HiGHSSolver::new) {
        Ok(report) => {
            output::spinner_success(&pb, &format!("Finished {trials} trials"));
            report
        }
        Err(e) => {
            output::spinner_fail(&pb, "Experiment failed");
            return Err(e);
        }
    };

    print_report(&report)
}

fn print_report(report: &ExperimentReport) -> Result<()> {
    if output::is_json() {
        output::json_output(&serde_json::to_value(report)?);
        return Ok(());
    }

    output::section("Experiment");
    output::field("Trials", report.trials);
    output::field("Seed", report.seed);
    output::field("Workers", report.workers);

    output::section("Results");
    let rows: Vec<MechanismRow> = report.mechanisms.iter().map(MechanismRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    output::note("Mean revenue covers every priced trial, empty-core fallbacks included");

    Ok(())
}
