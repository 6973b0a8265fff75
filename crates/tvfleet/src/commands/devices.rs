//! Device inventory handlers.

use std::net::Ipv4Addr;

use tabled::Tabled;

use tvfleet_core::{DeviceDirectory, DevicePatch, DeviceRecord, MacAddress};

use crate::cli::{DevicesArgs, DevicesCommand};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Paired")]
    paired: String,
    #[tabled(rename = "Model")]
    model: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(d: &DeviceRecord) -> Self {
        Self {
            address: d.address.clone(),
            name: d.display_name(),
            mac: d.mac.clone().unwrap_or_default(),
            paired: if d.has_token() { "yes" } else { "no" }.into(),
            model: d.model.clone().unwrap_or_default(),
        }
    }
}

fn detail(d: &DeviceRecord) -> String {
    [
        format!("Address:   {}", d.address),
        format!("Name:      {}", d.display_name()),
        format!("MAC:       {}", d.mac.as_deref().unwrap_or("-")),
        format!(
            "Broadcast: {}",
            d.broadcast.map_or_else(|| "(default)".into(), |b| b.to_string())
        ),
        format!("Model:     {}", d.model.as_deref().unwrap_or("-")),
        format!("Paired:    {}", if d.has_token() { "yes" } else { "no" }),
        format!(
            "Updated:   {}",
            d.last_updated
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ),
    ]
    .join("\n")
}

fn validated_patch(
    name: Option<String>,
    mac: Option<&str>,
    broadcast: Option<&str>,
    model: Option<String>,
) -> Result<DevicePatch, CliError> {
    let mac = mac
        .map(|m| {
            m.parse::<MacAddress>()
                .map(|parsed| parsed.to_string())
                .map_err(|e| CliError::Validation {
                    field: "mac".into(),
                    reason: e.to_string(),
                })
        })
        .transpose()?;
    let broadcast = broadcast
        .map(|b| {
            b.parse::<Ipv4Addr>().map_err(|e| CliError::Validation {
                field: "broadcast".into(),
                reason: format!("{b}: {e}"),
            })
        })
        .transpose()?;
    Ok(DevicePatch {
        name,
        mac,
        broadcast,
        model,
        token: None,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: DevicesArgs) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = ctx.directory()?.list();
            let out = output::render_list(
                ctx.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.address.clone(),
            );
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        DevicesCommand::Show { address } => {
            let device = ctx
                .directory()?
                .get(address.trim())
                .ok_or(CliError::DeviceNotFound { address })?;
            let out = output::render_single(ctx.output, &device, detail, |d| d.address.clone());
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        DevicesCommand::Add {
            address,
            name,
            mac,
            broadcast,
            model,
        } => {
            let address = address.trim();
            if address.is_empty() {
                return Err(CliError::Validation {
                    field: "address".into(),
                    reason: "must not be empty".into(),
                });
            }
            let patch = validated_patch(name, mac.as_deref(), broadcast.as_deref(), model)?;
            let device = ctx.directory()?.upsert(address, patch)?;
            tracing::info!(address, "device saved");
            let out = output::render_single(ctx.output, &device, detail, |d| d.address.clone());
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        DevicesCommand::Remove { address } => {
            let directory = ctx.directory()?;
            let address = address.trim();
            if directory.get(address).is_none() {
                return Err(CliError::DeviceNotFound {
                    address: address.into(),
                });
            }
            if !util::confirm(&format!("Remove device {address}?"), ctx.yes, "devices remove")? {
                return Ok(());
            }
            directory.remove(address)?;
            output::print_output(&format!("Removed {address}"), ctx.quiet);
            Ok(())
        }

        DevicesCommand::ForgetToken { address } => {
            let fleet = ctx.fleet()?;
            fleet.forget_token(address.trim())?;
            output::print_output(&format!("Token for {} cleared", address.trim()), ctx.quiet);
            Ok(())
        }
    }
}
