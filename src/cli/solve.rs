//! Handler for the `solve` command.

use tabled::{Table, Tabled};
use tracing::info;

use crate::adapter::solver::HiGHSSolver;
use crate::application::payment::{Outcome, PaymentStatus};
use crate::cli::{output, SolveArgs};
use crate::error::Result;
use crate::infrastructure::auction_file::AuctionFile;

#[derive(Tabled)]
struct WinnerRow {
    #[tabled(rename = "Agent")]
    agent: u32,
    #[tabled(rename = "Bundle")]
    bundle: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Payment")]
    payment: String,
}

/// Execute the solve command.
///
/// # Errors
///
/// Returns file, validation, solver and payment errors, including an empty
/// core.
pub fn execute(args: &SolveArgs) -> Result<()> {
    let mut config = args.config.load()?;
    args.log.apply(&mut config.logging, output::verbosity());
    config.validate()?;
    config.init_logging();

    let input = AuctionFile::load(&args.auction)?.into_input()?;
    info!(
        path = %args.auction.display(),
        mechanism = %args.mechanism,
        agents = input.auction.num_agents(),
        goods = input.auction.goods(),
        "Auction loaded"
    );

    let solver = HiGHSSolver::new();
    let pb = output::spinner(&format!("Running {}", args.mechanism));
    let outcome = match args.mechanism.run(
        &solver,
        &config.core,
        &input.auction,
        input.model.as_deref(),
        input.realization,
    ) {
        Ok(outcome) => {
            output::spinner_success(&pb, &format!("Priced with {}", args.mechanism));
            outcome
        }
        Err(e) => {
            output::spinner_fail(&pb, &format!("{} failed", args.mechanism));
            return Err(e.into());
        }
    };

    print_outcome(&outcome)
}

fn print_outcome(outcome: &Outcome) -> Result<()> {
    if output::is_json() {
        output::json_output(&serde_json::to_value(outcome)?);
        return Ok(());
    }

    let rows: Vec<WinnerRow> = outcome
        .allocation
        .winners()
        .iter()
        .map(|winner| {
            let bundle: Vec<String> = winner.bundle.iter().map(ToString::to_string).collect();
            WinnerRow {
                agent: winner.agent.get(),
                bundle: format!("{{{}}}", bundle.join(", ")),
                value: format!("{:.4}", winner.value),
                cost: format!("{:.4}", winner.cost),
                payment: outcome
                    .payments
                    .of(winner.agent)
                    .map_or_else(|| "-".to_string(), |p| format!("{p:.4}")),
            }
        })
        .collect();

    output::section("Allocation");
    if rows.is_empty() {
        output::note("No bid has positive surplus; nothing is allocated");
    } else {
        output::lines(&Table::new(rows).to_string());
    }

    output::section("Summary");
    output::field("Mechanism", output::highlight(outcome.mechanism));
    output::field("Welfare", format!("{:.4}", outcome.allocation.welfare()));
    output::field("Revenue", format!("{:.4}", outcome.payments.revenue()));
    match outcome.status {
        PaymentStatus::Computed => {
            output::field("Rounds", outcome.payments.iterations());
        }
        PaymentStatus::VcgInCore => {
            output::success("VCG payments already lie in the core");
        }
    }

    Ok(())
}
