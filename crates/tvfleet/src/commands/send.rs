//! Bulk send, power shortcuts and single raw key presses.

use tabled::Tabled;

use tvfleet_core::{BulkResult, CancellationToken, CommandOutcome};

use crate::cli::{KeyArgs, TargetArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl OutcomeRow {
    fn new(o: &CommandOutcome, color: bool) -> Self {
        Self {
            result: output::status_marker(o.success, color),
            address: o.address.clone(),
            name: o.name.clone(),
            message: o.message.clone(),
            time: output::secs(o.elapsed),
        }
    }
}

fn plain_line(o: &CommandOutcome) -> String {
    let status = if o.success { "ok" } else { "fail" };
    format!("{}\t{status}\t{}", o.address, o.message)
}

fn summary(result: &BulkResult, color: bool) -> String {
    let rows: Vec<OutcomeRow> = result
        .outcomes
        .iter()
        .map(|o| OutcomeRow::new(o, color))
        .collect();
    let footer = format!(
        "{}: {} succeeded, {} failed in {}",
        result.command,
        result.success_count,
        result.failure_count,
        output::secs(result.total_time)
    );
    format!("{}\n{}", output::render_table(&rows), output::dim(&footer, color))
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, command: &str, targets: &TargetArgs) -> Result<(), CliError> {
    let fleet = ctx.fleet()?;
    let targets = util::resolve_targets(ctx, fleet.directory().as_ref(), &targets.target)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling unfinished devices");
                cancel.cancel();
            }
        })
    };
    let result = fleet.execute_bulk_with(&targets, command, &cancel).await;
    interrupt.abort();
    let result = result?;

    let out = output::render_single(
        ctx.output,
        &result,
        |r| summary(r, ctx.color),
        |r| r.outcomes.iter().map(plain_line).collect::<Vec<_>>().join("\n"),
    );
    output::print_output(&out, ctx.quiet);

    if result.all_succeeded() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: result.failure_count,
            total: result.outcomes.len(),
        })
    }
}

pub async fn handle_key(ctx: &Context, args: &KeyArgs) -> Result<(), CliError> {
    let fleet = ctx.fleet()?;
    let outcome = fleet.send_key(args.address.trim(), &args.key_code).await;

    let out = output::render_single(
        ctx.output,
        &outcome,
        |o| output::render_table(&[OutcomeRow::new(o, ctx.color)]),
        plain_line,
    );
    output::print_output(&out, ctx.quiet);

    if outcome.success {
        Ok(())
    } else {
        Err(CliError::PartialFailure { failed: 1, total: 1 })
    }
}
