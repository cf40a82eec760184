use clap::Args;

use banquet_core::DataStore;

use super::OutputFormat;

/// Show where data is stored and what it contains
#[derive(Args)]
pub struct InfoCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Human-readable byte count.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{} B", bytes)
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}

impl InfoCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        let info = store.data_info();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            OutputFormat::Text => {
                println!("Data file:     {}", info.path.display());
                println!("File size:     {}", format_size(info.file_size));
                println!("Version:       {}", info.version);
                println!(
                    "Last modified: {}",
                    info.last_modified.format("%Y-%m-%d %H:%M:%S")
                );
                println!();
                println!("Ingredients:   {}", info.ingredient_count);
                println!("Dishes:        {}", info.dish_count);
                println!("Menus:         {}", info.menu_count);
            }
        }
        Ok(())
    }
}
