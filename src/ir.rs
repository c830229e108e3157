use crate::aggregate::AggregationMode;
use crate::layout::{ArrangementPolicy, LayoutOptions, OrderingPolicy, ValueFormat};
use serde::Serialize;

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// A fully resolved chart request: which attributes to aggregate and how to lay them out
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub primary: String,
    pub secondary: Option<String>,
    pub mode: AggregationMode,
    pub ordering: OrderingPolicy,
    pub arrangement: ArrangementPolicy,
    pub layout: LayoutOptions,
}

// =============================================================================
// Phase 2: Layout (Scene)
// =============================================================================

/// One renderable bar. Coordinates are in data space: slot `i` is centred at `i`
/// on the primary axis, heights are in aggregated-value units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub slot: usize,
    pub primary: String,
    pub secondary: Option<String>,
    pub count: usize,
    pub height: f64,
    /// Position of the bar centre on the primary axis
    pub center: f64,
    pub width: f64,
    /// Distance from the left edge of the slot's bar group (dodged bars)
    pub offset: f64,
    /// Cumulative height of the bars placed below this one (stacked bars)
    pub stack_offset: f64,
    pub fill: String,
    pub label: Option<String>,
}

impl ChartBar {
    pub fn bottom(&self) -> f64 {
        self.stack_offset
    }

    pub fn top(&self) -> f64 {
        self.stack_offset + self.height
    }

    /// Left and right edges on the primary axis
    pub fn extent(&self) -> (f64, f64) {
        let half = self.width / 2.0;
        (self.center - half, self.center + half)
    }

    /// Opposite corners in plot coordinates, swapping axes when the chart is flipped
    pub fn rect(&self, flipped: bool) -> ((f64, f64), (f64, f64)) {
        let (left, right) = self.extent();
        let tl = (left, self.top());
        let br = (right, self.bottom());
        if flipped {
            ((tl.1, tl.0), (br.1, br.0))
        } else {
            (tl, br)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAxis {
    pub title: String,
    /// Categories in slot order
    pub categories: Vec<String>,
    pub range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAxis {
    pub title: String,
    pub range: (f64, f64),
    pub breaks: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub format: ValueFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// The immutable description handed to a rendering backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartScene {
    pub title: Option<String>,
    pub mode: AggregationMode,
    pub arrangement: ArrangementPolicy,
    pub bars: Vec<ChartBar>,
    pub primary_axis: CategoryAxis,
    pub value_axis: ValueAxis,
    pub legend: Option<Legend>,
    /// Bars run horizontally, with the primary axis vertical
    pub flipped: bool,
    pub alpha: f64,
}

impl ChartScene {
    /// Bars belonging to one primary slot, in placement order
    pub fn slot_bars(&self, slot: usize) -> impl Iterator<Item = &ChartBar> {
        self.bars.iter().filter(move |b| b.slot == slot)
    }
}
