use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        match &config.config_file {
                            Some(path) => println!("Config file: {}", path.display()),
                            None => println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            ),
                        }
                        println!();

                        println!("data_file: {}", config.data_file.value.display());
                        println!("  source: {}", config.data_file.source);
                        println!();

                        let currency = if config.currency.value.is_empty() {
                            "(none)"
                        } else {
                            config.currency.value.as_str()
                        };
                        println!("currency: {}", currency);
                        println!("  source: {}", config.currency.source);
                    }
                }
                Ok(())
            }
        }
    }
}
