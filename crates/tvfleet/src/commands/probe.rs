//! Reachability report.

use serde::Serialize;
use tabled::Tabled;

use tvfleet_core::model::unknown_device_name;

use crate::cli::TargetArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ProbeReport {
    address: String,
    name: String,
    reachable: bool,
    elapsed: f64,
}

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time")]
    time: String,
}

pub async fn handle(ctx: &Context, targets: &TargetArgs) -> Result<(), CliError> {
    let fleet = ctx.fleet()?;
    let directory = fleet.directory();
    let targets = util::resolve_targets(ctx, directory.as_ref(), &targets.target)?;

    let reports: Vec<ProbeReport> = fleet
        .probe_all(&targets)
        .await
        .into_iter()
        .map(|(address, reachable, elapsed)| ProbeReport {
            name: directory
                .get(&address)
                .map_or_else(|| unknown_device_name(&address), |d| d.display_name()),
            address,
            reachable,
            elapsed: elapsed.as_secs_f64(),
        })
        .collect();

    let out = output::render_list(
        ctx.output,
        &reports,
        |r| ProbeRow {
            address: r.address.clone(),
            name: r.name.clone(),
            state: if r.reachable { "up" } else { "down" }.into(),
            time: format!("{:.3}s", r.elapsed),
        },
        |r| format!("{}\t{}", r.address, if r.reachable { "up" } else { "down" }),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
