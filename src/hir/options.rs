//! Generator options

use serde::{Deserialize, Serialize};

/// Options controlling model extraction and edit rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Name of the function reported as the automation entry point
    pub main_function: String,
    /// Display name given to the automation entry point
    pub automation_name: String,
    /// Report expression-bodied functions as data mapper entry points
    pub include_data_mappers: bool,
    /// Propagate connections through calls to module-level functions
    pub follow_function_calls: bool,
    /// Number of spaces per indentation level (or tab width if using tabs)
    pub tab_size: usize,
    /// Use spaces for indentation (false = use tabs)
    pub insert_spaces: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            main_function: "main".to_string(),
            automation_name: "automation".to_string(),
            include_data_mappers: true,
            follow_function_calls: true,
            tab_size: 4,
            insert_spaces: true,
        }
    }
}

impl GeneratorOptions {
    /// Generate indentation string for the given level
    pub fn indent(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size * level)
        } else {
            "\t".repeat(level)
        }
    }
}
