use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use banquet_core::{DataStore, Menu, RecordKind};

use crate::input;

#[derive(Args)]
pub struct ExportCommand {
    #[command(subcommand)]
    pub command: ExportSubcommand,
}

#[derive(Subcommand)]
pub enum ExportSubcommand {
    /// Export ingredients, dish recipes and menus to a workbook
    All {
        /// Output file (.xlsx is appended when no extension is given)
        path: PathBuf,
    },

    /// Export a menu's ingredient totals, dish breakdown and summary
    Menu {
        /// Menu ID or name
        menu: String,

        /// Output file (.xlsx is appended when no extension is given)
        path: PathBuf,
    },
}

fn menu_name(menu: &Menu) -> &str {
    &menu.name
}

fn workbook_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("xlsx")
    }
}

impl ExportCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ExportSubcommand::All { path } => {
                let path = workbook_path(path);
                store.export_to_spreadsheet(&path)?;
                tracing::info!("Exported catalog to {}", path.display());
                println!("Exported catalog to {}", path.display());
                Ok(())
            }

            ExportSubcommand::Menu { menu, path } => {
                let id = input::resolve(RecordKind::Menu, menu, store.menus(), menu_name)?;
                let name = store.menus()[id].name.clone();
                let path = workbook_path(path);

                store.export_menu_statistics(id, &name, &path)?;
                tracing::info!("Exported menu {} to {}", id, path.display());
                println!("Exported menu '{}' to {}", name, path.display());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_path_appends_extension() {
        assert_eq!(
            workbook_path(Path::new("out/banquet")),
            PathBuf::from("out/banquet.xlsx")
        );
    }

    #[test]
    fn test_workbook_path_keeps_extension() {
        assert_eq!(
            workbook_path(Path::new("report.xlsx")),
            PathBuf::from("report.xlsx")
        );
        assert_eq!(
            workbook_path(Path::new("report.xls")),
            PathBuf::from("report.xls")
        );
    }
}
