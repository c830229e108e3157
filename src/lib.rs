// Library exports for gramfreq

pub mod aggregate;
pub mod data;
pub mod error;
pub mod graph;
pub mod mtcars;
pub mod palette;
pub mod parser;
pub mod runtime;
pub mod table;

// Chart pipeline phases
pub mod ir;
pub mod layout;
pub mod resolve;
pub mod scale;

pub use aggregate::{aggregate, AggregatedTable, AggregationMode, CategoryKey};
pub use error::{GramError, Result};
pub use ir::ChartScene;
pub use layout::{plan, ArrangementPolicy, LayoutOptions, OrderingPolicy, ValueFormat};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

/// Settings loaded from a JSON config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub render: RenderOptions,
    /// Layout defaults the DSL can override
    #[serde(default)]
    pub layout: LayoutOptions,
}
