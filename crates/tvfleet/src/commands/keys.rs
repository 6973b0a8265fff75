//! Command name listing.

use serde::Serialize;
use tabled::Tabled;

use tvfleet_core::CommandRegistry;

use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize, Tabled)]
struct KeyRow {
    #[tabled(rename = "Command")]
    name: String,
    #[tabled(rename = "Key")]
    key: String,
}

pub fn handle(ctx: &Context) -> Result<(), CliError> {
    let rows: Vec<KeyRow> = ctx
        .keys()?
        .entries()
        .into_iter()
        .map(|(name, key)| KeyRow { name, key })
        .collect();

    let out = output::render_list(
        ctx.output,
        &rows,
        |r| KeyRow {
            name: r.name.clone(),
            key: r.key.clone(),
        },
        |r| r.name.clone(),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
