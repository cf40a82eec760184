use clap::{Args, Subcommand};
use std::collections::BTreeMap;

use banquet_core::{dish_cost_per_serving, sorted_by_id, DataStore, Dish, Ingredient, RecordKind};

use super::{confirm, format_quantity, truncate, OutputFormat};
use crate::config::Config;
use crate::input;

#[derive(Args)]
pub struct DishCommand {
    #[command(subcommand)]
    pub command: DishSubcommand,
}

#[derive(Subcommand)]
pub enum DishSubcommand {
    /// Add a dish recipe
    Add {
        /// Name of the dish
        name: String,

        /// Ingredient and its amount per serving (can be repeated)
        #[arg(long = "ingredient", short, value_name = "INGREDIENT=AMOUNT", required = true)]
        ingredients: Vec<String>,
    },

    /// List all dishes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a dish's recipe and cost
    Show {
        /// Dish ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing dish
    Update {
        /// Dish ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Set an ingredient's amount per serving (can be repeated)
        #[arg(long = "ingredient", short, value_name = "INGREDIENT=AMOUNT")]
        ingredients: Vec<String>,

        /// Remove an ingredient from the recipe (can be repeated)
        #[arg(long = "remove-ingredient", value_name = "INGREDIENT")]
        remove: Vec<String>,
    },

    /// Delete a dish (refused while a menu serves it)
    Delete {
        /// Dish ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn dish_name(dish: &Dish) -> &str {
    &dish.name
}

fn ingredient_name(ingredient: &Ingredient) -> &str {
    &ingredient.name
}

/// Parses `INGREDIENT=AMOUNT` arguments into recipe lines keyed by ingredient id.
fn parse_recipe(
    store: &DataStore,
    raw: &[String],
) -> Result<BTreeMap<String, f64>, Box<dyn std::error::Error>> {
    let mut recipe = BTreeMap::new();
    for item in raw {
        let (key, value) = input::pair(item)?;
        let id = input::resolve(
            RecordKind::Ingredient,
            key,
            store.ingredients(),
            ingredient_name,
        )?;
        recipe.insert(id.to_string(), input::amount(value)?);
    }
    Ok(recipe)
}

fn print_recipe(store: &DataStore, dish: &Dish, config: &Config) {
    println!(
        "{:<6}  {:<30}  {:>10}  {:<10}  COST",
        "ID", "INGREDIENT", "AMOUNT", "UNIT"
    );
    println!("{}", "-".repeat(70));
    for (id, amount) in sorted_by_id(&dish.ingredients) {
        match store.ingredient(id) {
            Some(ingredient) => println!(
                "{:<6}  {:<30}  {:>10}  {:<10}  {}",
                id,
                truncate(&ingredient.name, 30),
                format_quantity(*amount),
                truncate(&ingredient.unit, 10),
                config.money(ingredient.cost_of(*amount))
            ),
            None => println!(
                "{:<6}  {:<30}  {:>10}",
                id,
                "(missing ingredient)",
                format_quantity(*amount)
            ),
        }
    }
}

impl DishCommand {
    pub fn run(
        &self,
        store: &mut DataStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DishSubcommand::Add { name, ingredients } => {
                let name = input::required_text("Dish name", name)?;
                let recipe = parse_recipe(store, ingredients)?;

                let id = store.add_dish(name, recipe)?;
                if let Some(dish) = store.dish(&id) {
                    println!("Created dish #{}:\n", id);
                    print!("{}", dish);
                }
                Ok(())
            }

            DishSubcommand::List { format } => {
                let dishes = store.list_dishes();
                if dishes.is_empty() {
                    println!("No dishes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let rows: Vec<_> = dishes
                            .iter()
                            .map(|(id, dish)| {
                                serde_json::json!({
                                    "id": id,
                                    "name": dish.name,
                                    "ingredients": dish.ingredients,
                                    "cost_per_serving": dish_cost_per_serving(store.document(), dish),
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<6}  {:<30}  {:>11}  COST/SERVING",
                            "ID", "NAME", "INGREDIENTS"
                        );
                        println!("{}", "-".repeat(66));
                        for (id, dish) in &dishes {
                            println!(
                                "{:<6}  {:<30}  {:>11}  {}",
                                id,
                                truncate(&dish.name, 30),
                                dish.ingredients.len(),
                                config.money(dish_cost_per_serving(store.document(), dish))
                            );
                        }
                        println!("\nTotal: {} dish(es)", dishes.len());
                    }
                }
                Ok(())
            }

            DishSubcommand::Show { identifier, format } => {
                let id = input::resolve(RecordKind::Dish, identifier, store.dishes(), dish_name)?;
                let dish = &store.dishes()[id];
                let cost = dish_cost_per_serving(store.document(), dish);
                let used_by = store.menus_using_dish(id);

                match format {
                    OutputFormat::Json => {
                        let lines: Vec<_> = sorted_by_id(&dish.ingredients)
                            .into_iter()
                            .map(|(ingredient_id, amount)| {
                                let ingredient = store.ingredient(ingredient_id);
                                serde_json::json!({
                                    "ingredient_id": ingredient_id,
                                    "name": ingredient.map(|i| i.name.as_str()),
                                    "unit": ingredient.map(|i| i.unit.as_str()),
                                    "amount": amount,
                                })
                            })
                            .collect();
                        let output = serde_json::json!({
                            "id": id,
                            "name": dish.name,
                            "ingredients": lines,
                            "cost_per_serving": cost,
                            "used_by": used_by,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{} (#{})", dish.name, id);
                        println!();
                        print_recipe(store, dish, config);
                        println!("\nCost per serving: {}", config.money(cost));
                        if !used_by.is_empty() {
                            println!("\nServed on:");
                            for menu in &used_by {
                                println!("  - {}", menu);
                            }
                        }
                    }
                }
                Ok(())
            }

            DishSubcommand::Update {
                identifier,
                name,
                ingredients,
                remove,
            } => {
                if name.is_none() && ingredients.is_empty() && remove.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let id = input::resolve(RecordKind::Dish, identifier, store.dishes(), dish_name)?
                    .to_string();
                let current = store.dishes()[&id].clone();

                let name = match name {
                    Some(name) => input::required_text("Dish name", name)?,
                    None => current.name,
                };

                let recipe = input::merge_entries(
                    RecordKind::Dish,
                    RecordKind::Ingredient,
                    current.ingredients,
                    remove,
                    parse_recipe(store, ingredients)?,
                    store.ingredients(),
                    ingredient_name,
                )?;

                store.update_dish(&id, name, recipe)?;
                if let Some(dish) = store.dish(&id) {
                    println!("Updated dish #{}:\n", id);
                    print!("{}", dish);
                }
                Ok(())
            }

            DishSubcommand::Delete { identifier, force } => {
                let id = input::resolve(RecordKind::Dish, identifier, store.dishes(), dish_name)?
                    .to_string();
                let name = store.dishes()[&id].name.clone();

                let used_by = store.menus_using_dish(&id);
                if !used_by.is_empty() {
                    println!("'{}' is served on:", name);
                    for menu in &used_by {
                        println!("  - {}", menu);
                    }
                }

                if !force
                    && used_by.is_empty()
                    && !confirm(&format!("Delete dish '{}'?", name))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_dish(&id)?;
                println!("Deleted dish: {}", name);
                Ok(())
            }
        }
    }
}
