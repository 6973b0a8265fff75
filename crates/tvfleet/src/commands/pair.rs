//! Interactive pairing.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use tvfleet_core::Pairing;

use crate::cli::PairArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

fn spinner(address: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Waiting for {address}: accept the prompt on the TV"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub async fn handle(ctx: &Context, args: &PairArgs) -> Result<(), CliError> {
    let fleet = ctx.fleet()?;
    let address = args.address.trim();

    let pb = (!ctx.quiet && std::io::stderr().is_terminal()).then(|| spinner(address));
    let result = fleet.pair(address, args.force).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let message = match result? {
        Pairing::Cached => format!("{address} is already paired (use --force to pair again)"),
        Pairing::Issued => format!("Paired with {address}; token stored"),
    };
    let out = output::render_single(
        ctx.output,
        &serde_json::json!({ "address": address, "message": message }),
        |_| message.clone(),
        |_| message.clone(),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
