//! Server configuration, deserialized from `workspace/didChangeConfiguration`.

use std::path::PathBuf;

use awk_syntax::Dialect;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Diagnostics cap per document.
    pub max_number_of_problems: usize,
    /// `"gawk"` enables extensions; any other value means strict AWK.
    pub mode: String,
    pub stylistic_warnings: StylisticWarnings,
    /// Include search path. Falls back to `AWKPATH` split on `:`, then
    /// to the including file's own directory (`.`).
    pub path: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylisticWarnings {
    pub missing_semicolon: bool,
    pub compatibility: bool,
    pub check_function_calls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_number_of_problems: 100,
            mode: "gawk".to_string(),
            stylistic_warnings: StylisticWarnings::default(),
            path: None,
        }
    }
}

impl Default for StylisticWarnings {
    fn default() -> Self {
        StylisticWarnings {
            missing_semicolon: true,
            compatibility: true,
            check_function_calls: true,
        }
    }
}

impl Settings {
    pub fn dialect(&self) -> Dialect {
        if self.mode == "gawk" {
            Dialect::Gawk
        } else {
            Dialect::Posix
        }
    }

    pub fn include_path(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.path {
            if !path.is_empty() {
                return path.iter().map(PathBuf::from).collect();
            }
        }
        if let Ok(awkpath) = std::env::var("AWKPATH") {
            if !awkpath.is_empty() {
                return awkpath.split(':').filter(|p| !p.is_empty()).map(PathBuf::from).collect();
            }
        }
        vec![PathBuf::from(".")]
    }
}
