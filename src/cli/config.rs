//! Handler for the `config show` command.

use crate::cli::{output, ConfigArgs};
use crate::error::Result;

/// Print the effective configuration.
///
/// # Errors
///
/// Returns a configuration error if the file cannot be loaded.
pub fn execute_show(args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;

    if output::is_json() {
        output::json_output(&serde_json::to_value(&config)?);
        return Ok(());
    }

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", config.logging.format);

    output::section("Core");
    output::field("Tolerance", config.core.tolerance);
    output::field("Max iterations", config.core.max_iterations);
    output::field("Payment slack", config.core.payment_slack);
    output::field("IR tolerance", config.core.ir_tolerance);

    let experiment = &config.experiment;
    let mechanisms: Vec<String> = experiment.mechanisms.iter().map(ToString::to_string).collect();
    output::section("Experiment");
    output::field("Trials", experiment.trials);
    output::field("Seed", experiment.seed);
    output::field("Workers", experiment.worker_count());
    output::field("Mechanisms", mechanisms.join(", "));

    let llg = &experiment.llg;
    output::section("LLG instances");
    output::field("Local max", llg.local_max);
    output::field("Global max", llg.global_max);
    output::field("Cost max", llg.cost_max);
    output::field("Availability", format!("{:?}", llg.availability));

    Ok(())
}
