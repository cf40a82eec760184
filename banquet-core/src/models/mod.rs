mod dish;
mod ingredient;
mod menu;

pub use dish::Dish;
pub use ingredient::Ingredient;
pub use menu::Menu;
