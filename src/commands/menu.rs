use clap::{Args, Subcommand};
use std::collections::BTreeMap;

use banquet_core::report::menu_dish_breakdown;
use banquet_core::{DataStore, Dish, Menu, RecordKind};

use super::{confirm, truncate, OutputFormat};
use crate::config::Config;
use crate::input;

#[derive(Args)]
pub struct MenuCommand {
    #[command(subcommand)]
    pub command: MenuSubcommand,
}

#[derive(Subcommand)]
pub enum MenuSubcommand {
    /// Add a banquet menu
    Add {
        /// Name of the menu
        name: String,

        /// Dish and its servings per table (can be repeated)
        #[arg(long = "dish", short, value_name = "DISH=SERVINGS", required = true)]
        dishes: Vec<String>,

        /// Number of tables
        #[arg(long, short, default_value = "1")]
        tables: String,
    },

    /// List all menus
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a menu and its dishes
    Show {
        /// Menu ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing menu
    Update {
        /// Menu ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Set a dish's servings per table (can be repeated)
        #[arg(long = "dish", short, value_name = "DISH=SERVINGS")]
        dishes: Vec<String>,

        /// Remove a dish from the menu (can be repeated)
        #[arg(long = "remove-dish", value_name = "DISH")]
        remove: Vec<String>,

        /// New number of tables
        #[arg(long, short)]
        tables: Option<String>,
    },

    /// Delete a menu
    Delete {
        /// Menu ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn menu_name(menu: &Menu) -> &str {
    &menu.name
}

fn dish_name(dish: &Dish) -> &str {
    &dish.name
}

/// Parses `DISH=SERVINGS` arguments into menu lines keyed by dish id.
fn parse_servings(
    store: &DataStore,
    raw: &[String],
) -> Result<BTreeMap<String, u32>, Box<dyn std::error::Error>> {
    let mut dishes = BTreeMap::new();
    for item in raw {
        let (key, value) = input::pair(item)?;
        let id = input::resolve(RecordKind::Dish, key, store.dishes(), dish_name)?;
        dishes.insert(id.to_string(), input::count("Servings", value)?);
    }
    Ok(dishes)
}

impl MenuCommand {
    pub fn run(
        &self,
        store: &mut DataStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MenuSubcommand::Add {
                name,
                dishes,
                tables,
            } => {
                let name = input::required_text("Menu name", name)?;
                let dishes = parse_servings(store, dishes)?;
                let tables = input::count("Table count", tables)?;

                let id = store.add_menu(name, dishes, tables)?;
                if let Some(menu) = store.menu(&id) {
                    println!("Created menu #{}:\n", id);
                    print!("{}", menu);
                }
                Ok(())
            }

            MenuSubcommand::List { format } => {
                let menus = store.list_menus();
                if menus.is_empty() {
                    println!("No menus found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let rows: Vec<_> = menus
                            .iter()
                            .map(|(id, menu)| {
                                serde_json::json!({
                                    "id": id,
                                    "name": menu.name,
                                    "dishes": menu.dishes,
                                    "table_count": menu.table_count,
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<6}  {:<30}  {:>6}  {:>6}", "ID", "NAME", "DISHES", "TABLES");
                        println!("{}", "-".repeat(54));
                        for (id, menu) in &menus {
                            println!(
                                "{:<6}  {:<30}  {:>6}  {:>6}",
                                id,
                                truncate(&menu.name, 30),
                                menu.dishes.len(),
                                menu.table_count
                            );
                        }
                        println!("\nTotal: {} menu(s)", menus.len());
                    }
                }
                Ok(())
            }

            MenuSubcommand::Show { identifier, format } => {
                let id = input::resolve(RecordKind::Menu, identifier, store.menus(), menu_name)?;
                let menu = &store.menus()[id];
                let breakdown = menu_dish_breakdown(store.document(), id);
                let total_cost = store
                    .menu_cost_report(id)
                    .map(|report| report.total_cost)
                    .unwrap_or_default();

                match format {
                    OutputFormat::Json => {
                        let output = serde_json::json!({
                            "id": id,
                            "name": menu.name,
                            "table_count": menu.table_count,
                            "dishes": breakdown,
                            "total_cost": total_cost,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{} (#{})", menu.name, id);
                        println!("Tables: {}", menu.table_count);
                        println!();
                        println!(
                            "{:<6}  {:<30}  {:>9}  {:>6}",
                            "ID", "DISH", "PER TABLE", "TOTAL"
                        );
                        println!("{}", "-".repeat(57));
                        for line in &breakdown {
                            println!(
                                "{:<6}  {:<30}  {:>9}  {:>6}",
                                line.dish_id,
                                truncate(&line.name, 30),
                                line.servings_per_table,
                                line.total_servings
                            );
                        }
                        let missing = menu.dishes.len() - breakdown.len();
                        if missing > 0 {
                            println!("({} dish(es) no longer in the catalog)", missing);
                        }
                        println!("\nEstimated cost: {}", config.money(total_cost));
                    }
                }
                Ok(())
            }

            MenuSubcommand::Update {
                identifier,
                name,
                dishes,
                remove,
                tables,
            } => {
                if name.is_none() && dishes.is_empty() && remove.is_empty() && tables.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let id = input::resolve(RecordKind::Menu, identifier, store.menus(), menu_name)?
                    .to_string();
                let current = store.menus()[&id].clone();

                let name = match name {
                    Some(name) => input::required_text("Menu name", name)?,
                    None => current.name,
                };
                let tables = match tables {
                    Some(tables) => input::count("Table count", tables)?,
                    None => current.table_count,
                };

                let servings = input::merge_entries(
                    RecordKind::Menu,
                    RecordKind::Dish,
                    current.dishes,
                    remove,
                    parse_servings(store, dishes)?,
                    store.dishes(),
                    dish_name,
                )?;

                store.update_menu(&id, name, servings, tables)?;
                if let Some(menu) = store.menu(&id) {
                    println!("Updated menu #{}:\n", id);
                    print!("{}", menu);
                }
                Ok(())
            }

            MenuSubcommand::Delete { identifier, force } => {
                let id = input::resolve(RecordKind::Menu, identifier, store.menus(), menu_name)?
                    .to_string();
                let name = store.menus()[&id].name.clone();

                if !force && !confirm(&format!("Delete menu '{}'?", name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_menu(&id)?;
                println!("Deleted menu: {}", name);
                Ok(())
            }
        }
    }
}
