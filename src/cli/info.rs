//! Palette listing commands

use clap::Subcommand;
use std::path::Path;
use std::process::ExitCode;

use crate::registry::PaletteRegistry;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum PaletteAction {
    /// List all configured palettes
    List,
    /// Show the blocks of a specific palette
    Show {
        /// Name of the palette to show
        name: String,
    },
}

/// Execute the palettes command
pub fn run_palettes(action: PaletteAction, config: Option<&Path>) -> ExitCode {
    let registry = match PaletteRegistry::load(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match action {
        PaletteAction::List => {
            print!("{}", format_palette_list(&registry));
            ExitCode::from(EXIT_SUCCESS)
        }
        PaletteAction::Show { name } => match registry.palette(&name) {
            Ok(palette) => {
                println!("Palette: {} ({})", palette.name(), palette.kind());
                println!();
                for (i, block) in palette.blocks().iter().enumerate() {
                    println!("  {:>3}  {}", i, block);
                }
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        },
    }
}

/// One line per palette, default marked with `*`.
pub fn format_palette_list(registry: &PaletteRegistry) -> String {
    let default = &registry.bounds().default_palette;
    let mut out = String::from("Available palettes:\n");
    for palette in registry.palettes() {
        let marker = if palette.name() == default { "*" } else { " " };
        out.push_str(&format!(
            "{} {} ({}, {} blocks)\n",
            marker,
            palette.name(),
            palette.kind(),
            palette.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_palette_list_marks_default() {
        let registry = PaletteRegistry::from_toml(
            r#"
[image]
height = 100
default_colormap = "one_value.bw"
building_time_delay = 0.0

[image.size]
min = 8
max = 512
default = 64

[image.blocks]
"one_value.bw" = [[35, 15], [35, 0]]
"multi_value.rgb" = [[35, 14], [35, 5], [35, 11]]
"#,
        )
        .unwrap();
        let listing = format_palette_list(&registry);
        assert!(listing.contains("  multi_value.rgb (multi-value, 3 blocks)"));
        assert!(listing.contains("* one_value.bw (single-value, 2 blocks)"));
    }
}
