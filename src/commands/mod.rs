mod config_cmd;
mod dish;
mod export;
mod info;
mod ingredient;
mod menu;
mod report;

pub use config_cmd::ConfigCommand;
pub use dish::DishCommand;
pub use export::ExportCommand;
pub use info::InfoCommand;
pub use ingredient::IngredientCommand;
pub use menu::MenuCommand;
pub use report::ReportCommand;

use clap::ValueEnum;
use std::io::{self, Write};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Asks a yes/no question on stdin; anything but "y" is a no.
fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Format a quantity, removing unnecessary decimal places.
///
/// Values below 0.01 keep two significant digits so they never print as 0.
fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        return format!("{:.0}", qty);
    }

    let magnitude = qty.abs();
    let decimals = if magnitude < 0.01 {
        (-magnitude.log10()).floor() as usize + 2
    } else {
        2
    };
    let fixed = format!("{:.*}", decimals, qty);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Shortens a name to `width` characters for table columns.
fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() > width {
        let kept: String = name.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        name.to_string()
    }
}
