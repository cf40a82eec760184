use clap::Args;

use banquet_core::{DataStore, Menu, RecordKind};

use super::{format_quantity, truncate, OutputFormat};
use crate::config::Config;
use crate::input;

/// Shopping list and cost estimate for a menu
#[derive(Args)]
pub struct ReportCommand {
    /// Menu ID or name
    pub menu: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

fn menu_name(menu: &Menu) -> &str {
    &menu.name
}

impl ReportCommand {
    pub fn run(&self, store: &DataStore, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let id = input::resolve(RecordKind::Menu, &self.menu, store.menus(), menu_name)?;
        let report = store
            .menu_cost_report(id)
            .ok_or_else(|| format!("Menu not found: {}", self.menu))?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                println!("{} (#{})", report.menu_name, report.menu_id);
                println!("Tables: {}", report.table_count);
                println!();

                if report.is_empty() {
                    println!("No ingredients needed");
                    return Ok(());
                }

                println!(
                    "{:<30}  {:>12}  {:<10}  {:>12}  {:>12}",
                    "INGREDIENT", "QUANTITY", "UNIT", "UNIT PRICE", "COST"
                );
                println!("{}", "-".repeat(84));
                for line in &report.lines {
                    println!(
                        "{:<30}  {:>12}  {:<10}  {:>12}  {:>12}",
                        truncate(&line.name, 30),
                        format_quantity(line.quantity),
                        truncate(&line.unit, 10),
                        config.money(line.unit_price),
                        config.money(line.cost)
                    );
                }
                println!("{}", "-".repeat(84));
                println!("{:<72}  {:>12}", "TOTAL", config.money(report.total_cost));
            }
        }
        Ok(())
    }
}
