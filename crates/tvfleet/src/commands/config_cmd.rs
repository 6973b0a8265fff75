//! Config subcommand handlers.

use tvfleet_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

pub fn handle(ctx: &Context, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Path => {
            output::print_output(&ctx.config_path.display().to_string(), ctx.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(&ctx.config).map_err(tvfleet_config::ConfigError::from)?;
            let mut out = format!(
                "# {}\n# devices: {}\n# keys: {}\n\n{rendered}",
                ctx.config_path.display(),
                ctx.devices_path.display(),
                ctx.keys_path.display(),
            );
            if !ctx.config_path.exists() {
                out.insert_str(0, "# (file not found, showing defaults)\n");
            }
            output::print_output(out.trim_end(), ctx.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = &ctx.config_path;
            if path.exists() && !*force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            tvfleet_config::save_config_to(&Config::default(), path)?;
            output::print_output(&format!("Wrote {}", path.display()), ctx.quiet);
            Ok(())
        }
    }
}
