use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banquet_core::DataStore;

mod commands;
mod config;
mod input;

use commands::{
    ConfigCommand, DishCommand, ExportCommand, IngredientCommand, InfoCommand, MenuCommand,
    ReportCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "banquet")]
#[command(version)]
#[command(about = "Banquet dish recipes, menus and cost estimates", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the ingredient catalog
    Ingredient(IngredientCommand),

    /// Manage dish recipes
    Dish(DishCommand),

    /// Manage banquet menus
    Menu(MenuCommand),

    /// Ingredient quantities and cost for a menu
    Report(ReportCommand),

    /// Export data to an .xlsx workbook
    Export(ExportCommand),

    /// Show data file information
    Info(InfoCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banquet=warn,banquet_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    // Config display should not create a data file.
    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let mut store = DataStore::open_at(config.data_file.value.clone());

    match command {
        Commands::Ingredient(cmd) => cmd.run(&mut store, &config)?,
        Commands::Dish(cmd) => cmd.run(&mut store, &config)?,
        Commands::Menu(cmd) => cmd.run(&mut store, &config)?,
        Commands::Report(cmd) => cmd.run(&store, &config)?,
        Commands::Export(cmd) => cmd.run(&store)?,
        Commands::Info(cmd) => cmd.run(&store)?,
        Commands::Config(cmd) => cmd.run(&config)?,
    }

    Ok(())
}
