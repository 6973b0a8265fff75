//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tvfleet_core::DeviceDirectory;

use crate::commands::Context;
use crate::error::CliError;

/// Expand `--target` values. `all` (any case) means every device in the
/// inventory; anything else is taken as an address. Explicit addresses
/// given alongside `all` are kept, ahead of the inventory.
pub fn resolve_targets(
    ctx: &Context,
    directory: &dyn DeviceDirectory,
    targets: &[String],
) -> Result<Vec<String>, CliError> {
    let is_all = |t: &String| t.trim().eq_ignore_ascii_case("all");
    if !targets.iter().any(is_all) {
        return Ok(targets.to_vec());
    }

    let mut resolved: Vec<String> = targets.iter().filter(|t| !is_all(t)).cloned().collect();
    for device in directory.list() {
        if !resolved.iter().any(|t| t.trim() == device.address) {
            resolved.push(device.address);
        }
    }
    if resolved.is_empty() {
        return Err(CliError::NoDevices {
            path: ctx.devices_path.display().to_string(),
        });
    }
    Ok(resolved)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tvfleet_config::Config;
    use tvfleet_core::{DevicePatch, MemoryDirectory};

    fn ctx() -> Context {
        Context {
            config: Config::default(),
            config_path: "config.toml".into(),
            devices_path: "devices.toml".into(),
            keys_path: "keys.toml".into(),
            output: OutputFormat::Plain,
            color: false,
            quiet: true,
            yes: false,
            workers: None,
            deadline: None,
        }
    }

    #[test]
    fn explicit_targets_pass_through() {
        let dir = MemoryDirectory::new();
        let targets = vec!["10.0.0.9".to_owned(), "10.0.0.8".to_owned()];
        assert_eq!(resolve_targets(&ctx(), &dir, &targets).unwrap(), targets);
    }

    #[test]
    fn all_expands_to_inventory() {
        let dir = MemoryDirectory::new();
        dir.upsert("10.0.0.2", DevicePatch::default()).unwrap();
        dir.upsert("10.0.0.1", DevicePatch::default()).unwrap();
        let got = resolve_targets(&ctx(), &dir, &["ALL".to_owned()]).unwrap();
        assert_eq!(got, ["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn all_keeps_explicit_addresses() {
        let dir = MemoryDirectory::new();
        dir.upsert("10.0.0.1", DevicePatch::default()).unwrap();
        dir.upsert("10.0.0.2", DevicePatch::default()).unwrap();
        let targets = ["all", "10.0.0.9", "10.0.0.2"].map(str::to_owned);
        let got = resolve_targets(&ctx(), &dir, &targets).unwrap();
        assert_eq!(got, ["10.0.0.9", "10.0.0.2", "10.0.0.1"]);

        let got = resolve_targets(&ctx(), &MemoryDirectory::new(), &targets[..2]).unwrap();
        assert_eq!(got, ["10.0.0.9"]);
    }

    #[test]
    fn all_with_empty_inventory_is_an_error() {
        let err = resolve_targets(&ctx(), &MemoryDirectory::new(), &["all".to_owned()]).unwrap_err();
        assert!(matches!(err, CliError::NoDevices { .. }));
    }
}
