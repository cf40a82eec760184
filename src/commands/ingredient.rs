use clap::{Args, Subcommand};

use banquet_core::{DataStore, Ingredient, RecordKind};

use super::{confirm, truncate, OutputFormat};
use crate::config::Config;
use crate::input;

#[derive(Args)]
pub struct IngredientCommand {
    #[command(subcommand)]
    pub command: IngredientSubcommand,
}

#[derive(Subcommand)]
pub enum IngredientSubcommand {
    /// Add an ingredient to the catalog
    Add {
        /// Name of the ingredient
        name: String,

        /// Unit of measurement (e.g. kg, g, bunch)
        #[arg(long, short)]
        unit: String,

        /// Price per unit
        #[arg(long, short, default_value = "0")]
        price: String,
    },

    /// List all ingredients
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show ingredients whose name contains this text
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Show an ingredient and the dishes that use it
    Show {
        /// Ingredient ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing ingredient
    Update {
        /// Ingredient ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New unit
        #[arg(long, short)]
        unit: Option<String>,

        /// New price per unit
        #[arg(long, short)]
        price: Option<String>,
    },

    /// Delete an ingredient (refused while a dish uses it)
    Delete {
        /// Ingredient ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn ingredient_name(ingredient: &Ingredient) -> &str {
    &ingredient.name
}

impl IngredientCommand {
    pub fn run(
        &self,
        store: &mut DataStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            IngredientSubcommand::Add { name, unit, price } => {
                let name = input::required_text("Ingredient name", name)?;
                let unit = input::required_text("Unit", unit)?;
                let price = input::price(price)?;

                let id = store.add_ingredient(name, unit, price)?;
                if let Some(ingredient) = store.ingredient(&id) {
                    println!("Created ingredient #{}:", id);
                    println!("  {}", ingredient);
                }
                Ok(())
            }

            IngredientSubcommand::List { format, search } => {
                let needle = search.as_deref().map(str::to_lowercase);
                let ingredients: Vec<_> = store
                    .list_ingredients()
                    .into_iter()
                    .filter(|(_, ing)| match &needle {
                        Some(needle) => ing.name.to_lowercase().contains(needle),
                        None => true,
                    })
                    .collect();

                if ingredients.is_empty() {
                    println!("No ingredients found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let rows: Vec<_> = ingredients
                            .iter()
                            .map(|(id, ing)| {
                                serde_json::json!({
                                    "id": id,
                                    "name": ing.name,
                                    "unit": ing.unit,
                                    "price": ing.price,
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<6}  {:<30}  {:<10}  UNIT PRICE", "ID", "NAME", "UNIT");
                        println!("{}", "-".repeat(64));
                        for (id, ing) in &ingredients {
                            println!(
                                "{:<6}  {:<30}  {:<10}  {}",
                                id,
                                truncate(&ing.name, 30),
                                truncate(&ing.unit, 10),
                                config.money(ing.price)
                            );
                        }
                        println!("\nTotal: {} ingredient(s)", ingredients.len());
                    }
                }
                Ok(())
            }

            IngredientSubcommand::Show { identifier, format } => {
                let id = input::resolve(
                    RecordKind::Ingredient,
                    identifier,
                    store.ingredients(),
                    ingredient_name,
                )?;
                let ingredient = &store.ingredients()[id];
                let used_by = store.dishes_using_ingredient(id);

                match format {
                    OutputFormat::Json => {
                        let output = serde_json::json!({
                            "id": id,
                            "name": ingredient.name,
                            "unit": ingredient.unit,
                            "price": ingredient.price,
                            "used_by": used_by,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{} (#{})", ingredient.name, id);
                        println!("Unit:  {}", ingredient.unit);
                        println!(
                            "Price: {} per {}",
                            config.money(ingredient.price),
                            ingredient.unit
                        );
                        if used_by.is_empty() {
                            println!("\nNot used by any dish");
                        } else {
                            println!("\nUsed by:");
                            for dish in &used_by {
                                println!("  - {}", dish);
                            }
                        }
                    }
                }
                Ok(())
            }

            IngredientSubcommand::Update {
                identifier,
                name,
                unit,
                price,
            } => {
                if name.is_none() && unit.is_none() && price.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let id = input::resolve(
                    RecordKind::Ingredient,
                    identifier,
                    store.ingredients(),
                    ingredient_name,
                )?
                .to_string();
                let current = store.ingredients()[&id].clone();

                let name = match name {
                    Some(name) => input::required_text("Ingredient name", name)?,
                    None => current.name,
                };
                let unit = match unit {
                    Some(unit) => input::required_text("Unit", unit)?,
                    None => current.unit,
                };
                let price = match price {
                    Some(price) => input::price(price)?,
                    None => current.price,
                };

                store.update_ingredient(&id, name, unit, price)?;
                if let Some(ingredient) = store.ingredient(&id) {
                    println!("Updated ingredient #{}:", id);
                    println!("  {}", ingredient);
                }
                Ok(())
            }

            IngredientSubcommand::Delete { identifier, force } => {
                let id = input::resolve(
                    RecordKind::Ingredient,
                    identifier,
                    store.ingredients(),
                    ingredient_name,
                )?
                .to_string();
                let name = store.ingredients()[&id].name.clone();

                // Report blockers before asking for confirmation.
                let used_by = store.dishes_using_ingredient(&id);
                if !used_by.is_empty() {
                    println!("'{}' is used by:", name);
                    for dish in &used_by {
                        println!("  - {}", dish);
                    }
                }

                if !force
                    && used_by.is_empty()
                    && !confirm(&format!("Delete ingredient '{}'?", name))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_ingredient(&id)?;
                println!("Deleted ingredient: {}", name);
                Ok(())
            }
        }
    }
}
