//! Analysis configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Query catalog and report output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Directory for per-query JSON and SVG output
    #[serde(default = "defaults::analysis_output_dir")]
    pub output_dir: String,

    /// Write SVG charts next to the JSON summaries
    #[serde(default = "defaults::enabled")]
    pub render: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            catalog_path: None,
            output_dir: defaults::analysis_output_dir(),
            render: true,
        }
    }
}
