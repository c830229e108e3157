// Abstract Syntax Tree for the bar-chart DSL

use crate::aggregate::AggregationMode;
use crate::layout::{ArrangementPolicy, AxisRange, OrderingPolicy, ValueFormat};
use serde::{Deserialize, Serialize};

/// Complete plot specification
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub aesthetics: Option<Aesthetics>,
    pub bar: BarLayer,
    pub labels: Option<Labels>,
    pub coord: Option<CoordSystem>,
    pub y_scale: Option<AxisScale>,
}

/// Aesthetic mappings (data columns → visual properties)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aesthetics {
    /// Column placed on the primary (category) axis
    pub x: String,
    /// Column whose values split each bar into coloured groups
    pub fill: Option<String>,
}

/// The bar geometry layer and its statistic
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarLayer {
    pub stat: Option<AggregationMode>,
    pub position: Option<ArrangementPolicy>,
    pub order: Option<OrderingPolicy>,
    pub width: Option<f64>,
    /// Fixed fill colour (ungrouped bars)
    pub fill: Option<String>,
    pub alpha: Option<f64>,
    pub labels: bool,
    pub digits: Option<usize>,
}

/// Plot labels (title, axes, legend)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordSystem {
    Cartesian,
    Flip,
}

/// Value-axis configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisScale {
    pub format: Option<ValueFormat>,
    pub limits: Option<AxisRange>,
}
