use crate::aggregate::{sort_categories, AggregatedCell, AggregatedTable, AggregationMode};
use crate::error::{GramError, Result};
use crate::ir::{CategoryAxis, ChartBar, ChartScene, Legend, LegendEntry, ValueAxis};
use crate::palette::{ColorPalette, DEFAULT_FILL};
use crate::parser::ast::Labels;
use crate::scale::build_value_scale;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Order of the categories along the primary axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// First-encountered order in the source dataset
    #[default]
    DatasetOrder,
    /// Category labels ascending (numerically when they are numbers)
    AscendingValue,
    /// Category labels descending
    DescendingValue,
    /// Summed aggregated value, highest first; ties keep dataset order
    DescendingFrequency,
}

impl FromStr for OrderingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dataset" | "data" => Ok(OrderingPolicy::DatasetOrder),
            "asc" | "ascending" => Ok(OrderingPolicy::AscendingValue),
            "desc" | "descending" => Ok(OrderingPolicy::DescendingValue),
            "desc_freq" | "infreq" | "frequency" => Ok(OrderingPolicy::DescendingFrequency),
            other => Err(format!("unknown order '{}'", other)),
        }
    }
}

/// How bars sharing a primary slot are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArrangementPolicy {
    /// Full-width bars drawn over one another
    #[default]
    None,
    Stacked,
    Dodged,
}

impl FromStr for ArrangementPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "none" => Ok(ArrangementPolicy::None),
            "stack" | "stacked" => Ok(ArrangementPolicy::Stacked),
            "dodge" | "dodged" => Ok(ArrangementPolicy::Dodged),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[default]
    Raw,
    Percentage,
}

/// Explicit value-axis limits with an optional tick step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutOptions {
    /// Fraction of each slot occupied by its bars
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
    #[serde(default)]
    pub value_format: ValueFormat,
    /// Decimal places for value labels; derived from the format and mode when unset
    #[serde(default)]
    pub precision: Option<usize>,
    #[serde(default)]
    pub show_value_labels: bool,
    #[serde(default)]
    pub axis_range: Option<AxisRange>,
    #[serde(default)]
    pub flip: bool,
    /// Fixed fill for ungrouped bars
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub labels: Labels,
}

fn default_bar_width() -> f64 { 0.6 }
fn default_alpha() -> f64 { 1.0 }

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            value_format: ValueFormat::Raw,
            precision: None,
            show_value_labels: false,
            axis_range: None,
            flip: false,
            fill: None,
            alpha: default_alpha(),
            labels: Labels::default(),
        }
    }
}

impl LayoutOptions {
    pub fn resolved_precision(&self, mode: AggregationMode) -> usize {
        self.precision.unwrap_or(match (self.value_format, mode) {
            (ValueFormat::Percentage, _) => 0,
            (ValueFormat::Raw, AggregationMode::Count) => 0,
            (ValueFormat::Raw, _) => 2,
        })
    }

    fn validate(&self) -> Result<()> {
        if !(self.bar_width > 0.0 && self.bar_width <= 1.0) {
            return Err(GramError::InvalidOptions(format!(
                "bar width must be in (0, 1], got {}",
                self.bar_width
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(GramError::InvalidOptions(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        if let Some(range) = &self.axis_range {
            if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
                return Err(GramError::InvalidOptions(format!(
                    "axis range [{}, {}] is empty",
                    range.min, range.max
                )));
            }
            if let Some(step) = range.step {
                if !(step > 0.0) {
                    return Err(GramError::InvalidOptions(format!(
                        "tick step must be positive, got {}",
                        step
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Turn an aggregated table into an ordered, positioned bar scene
pub fn plan(
    table: &AggregatedTable,
    ordering: OrderingPolicy,
    arrangement: ArrangementPolicy,
    options: &LayoutOptions,
) -> Result<ChartScene> {
    options.validate()?;

    if arrangement != ArrangementPolicy::None && !table.has_secondary() {
        return Err(GramError::IncompatibleArrangement(format!(
            "{:?} bars need a secondary attribute, but '{}' was aggregated alone",
            arrangement, table.key.primary
        )));
    }

    let order = order_categories(table, ordering);
    let fills = ColorPalette::category10().assign_colors(&table.secondary_levels);
    let precision = options.resolved_precision(table.mode);

    let mut bars = Vec::with_capacity(table.cells.len());
    for (slot, primary) in order.iter().enumerate() {
        // Cells are already in canonical secondary order within a primary category
        let cells: Vec<&AggregatedCell> =
            table.cells.iter().filter(|c| &c.primary == primary).collect();
        let occupants = cells.len();
        let slot_center = slot as f64;
        let mut stack_height = 0.0;

        for (rank, cell) in cells.into_iter().enumerate() {
            let (center, width, offset, stack_offset) = match arrangement {
                ArrangementPolicy::Dodged => {
                    let width = options.bar_width / occupants as f64;
                    let offset = rank as f64 * width;
                    let center = slot_center - options.bar_width / 2.0 + offset + width / 2.0;
                    (center, width, offset, 0.0)
                }
                ArrangementPolicy::Stacked => {
                    let below = stack_height;
                    stack_height += cell.value;
                    (slot_center, options.bar_width, 0.0, below)
                }
                ArrangementPolicy::None => (slot_center, options.bar_width, 0.0, 0.0),
            };

            let fill = match &cell.secondary {
                Some(s) => fills.get(s).cloned().unwrap_or_else(|| DEFAULT_FILL.to_string()),
                None => options.fill.clone().unwrap_or_else(|| DEFAULT_FILL.to_string()),
            };

            bars.push(ChartBar {
                slot,
                primary: cell.primary.clone(),
                secondary: cell.secondary.clone(),
                count: cell.count,
                height: cell.value,
                center,
                width,
                offset,
                stack_offset,
                fill,
                label: if options.show_value_labels {
                    Some(format_value(cell.value, options.value_format, precision))
                } else {
                    None
                },
            });
        }
    }

    let max_top = bars.iter().map(|b| b.top()).fold(0.0, f64::max);
    let (range, breaks) = build_value_scale(max_top, options.axis_range.as_ref());
    let tick_decimals = tick_decimals(&breaks, options.value_format);
    let tick_labels = breaks
        .iter()
        .map(|&b| format_value(b, options.value_format, tick_decimals))
        .collect();

    let legend = table.key.secondary.as_ref().map(|secondary| Legend {
        title: options.labels.fill.clone().unwrap_or_else(|| secondary.clone()),
        entries: table
            .secondary_levels
            .iter()
            .map(|level| LegendEntry {
                label: level.clone(),
                fill: fills.get(level).cloned().unwrap_or_else(|| DEFAULT_FILL.to_string()),
            })
            .collect(),
    });

    let n = order.len() as f64;
    Ok(ChartScene {
        title: options.labels.title.clone(),
        mode: table.mode,
        arrangement,
        bars,
        primary_axis: CategoryAxis {
            title: options.labels.x.clone().unwrap_or_else(|| table.key.primary.clone()),
            categories: order,
            range: (-0.5, (n - 0.5).max(0.5)),
        },
        value_axis: ValueAxis {
            title: options.labels.y.clone().unwrap_or_else(|| table.mode.axis_title().to_string()),
            range,
            breaks,
            tick_labels,
            format: options.value_format,
        },
        legend,
        flipped: options.flip,
        alpha: options.alpha,
    })
}

fn order_categories(table: &AggregatedTable, policy: OrderingPolicy) -> Vec<String> {
    let mut levels = table.primary_levels.clone();
    match policy {
        OrderingPolicy::DatasetOrder => {}
        OrderingPolicy::AscendingValue => sort_categories(&mut levels),
        OrderingPolicy::DescendingValue => {
            sort_categories(&mut levels);
            levels.reverse();
        }
        OrderingPolicy::DescendingFrequency => {
            let totals: HashMap<String, f64> = levels
                .iter()
                .map(|l| (l.clone(), table.primary_total(l)))
                .collect();
            // sort_by is stable, so ties stay in dataset order
            levels.sort_by(|a, b| {
                totals[b]
                    .partial_cmp(&totals[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }
    levels
}

/// Format a value for display: raw with `precision` decimals, or as a percentage
pub fn format_value(value: f64, format: ValueFormat, precision: usize) -> String {
    match format {
        ValueFormat::Raw => format!("{:.*}", precision, value),
        ValueFormat::Percentage => format!("{:.*}%", precision, value * 100.0),
    }
}

/// Enough decimals to tell adjacent ticks apart
fn tick_decimals(breaks: &[f64], format: ValueFormat) -> usize {
    let step = match breaks {
        [a, b, ..] => b - a,
        _ => return 0,
    };
    let step = match format {
        ValueFormat::Raw => step,
        ValueFormat::Percentage => step * 100.0,
    };
    if !(step > 0.0) || !step.is_finite() {
        return 0;
    }
    // Fewest decimals that print the step exactly (0.25 -> 2, 2.5% -> 1)
    (0..MAX_TICK_DECIMALS)
        .find(|&d| {
            let scaled = step * 10f64.powi(d as i32);
            (scaled.round() - scaled).abs() < 1e-9 * scaled.max(1.0)
        })
        .unwrap_or(MAX_TICK_DECIMALS)
}

const MAX_TICK_DECIMALS: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::mtcars;
    use float_eq::assert_float_eq;

    fn cyl_by_am(mode: AggregationMode) -> AggregatedTable {
        let ds = mtcars::dataset().unwrap();
        aggregate(&ds, "cyl", Some("am"), mode).unwrap()
    }

    fn cyl_only(mode: AggregationMode) -> AggregatedTable {
        let ds = mtcars::dataset().unwrap();
        aggregate(&ds, "cyl", None, mode).unwrap()
    }

    #[test]
    fn test_dataset_order() {
        let scene = plan(
            &cyl_only(AggregationMode::Count),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::None,
            &LayoutOptions::default(),
        )
        .unwrap();
        // Mazda RX4 (6) comes first, then Datsun 710 (4), then Hornet Sportabout (8)
        assert_eq!(scene.primary_axis.categories, vec!["6", "4", "8"]);
        assert_eq!(scene.bars.len(), 3);
        assert_eq!(scene.bars[0].fill, DEFAULT_FILL);
        assert!(scene.legend.is_none());
    }

    #[test]
    fn test_value_ordering() {
        let table = cyl_only(AggregationMode::Count);
        let opts = LayoutOptions::default();
        let asc = plan(&table, OrderingPolicy::AscendingValue, ArrangementPolicy::None, &opts).unwrap();
        let desc = plan(&table, OrderingPolicy::DescendingValue, ArrangementPolicy::None, &opts).unwrap();
        assert_eq!(asc.primary_axis.categories, vec!["4", "6", "8"]);
        assert_eq!(desc.primary_axis.categories, vec!["8", "6", "4"]);
    }

    #[test]
    fn test_descending_frequency_dodged() {
        let scene = plan(
            &cyl_by_am(AggregationMode::Count),
            OrderingPolicy::DescendingFrequency,
            ArrangementPolicy::Dodged,
            &LayoutOptions::default(),
        )
        .unwrap();
        assert_eq!(scene.primary_axis.categories, vec!["8", "4", "6"]);

        for slot in 0..3 {
            let bars: Vec<&ChartBar> = scene.slot_bars(slot).collect();
            assert_eq!(bars.len(), 2);
            let (_, right0) = bars[0].extent();
            let (left1, _) = bars[1].extent();
            assert!(right0 <= left1 + 1e-12, "dodged bars overlap in slot {}", slot);
            // The group stays centred on its slot
            let (left0, _) = bars[0].extent();
            let (_, right1) = bars[1].extent();
            assert_float_eq!((left0 + right1) / 2.0, slot as f64, abs <= 1e-12);
            assert_float_eq!(bars[1].offset, bars[0].width, abs <= 1e-12);
        }
    }

    #[test]
    fn test_frequency_ties_keep_dataset_order() {
        // Conditional totals are all 1.0
        let scene = plan(
            &cyl_by_am(AggregationMode::ConditionalProbability),
            OrderingPolicy::DescendingFrequency,
            ArrangementPolicy::Stacked,
            &LayoutOptions::default(),
        )
        .unwrap();
        assert_eq!(scene.primary_axis.categories, vec!["6", "4", "8"]);
    }

    #[test]
    fn test_stacked_offsets() {
        let scene = plan(
            &cyl_by_am(AggregationMode::Count),
            OrderingPolicy::AscendingValue,
            ArrangementPolicy::Stacked,
            &LayoutOptions::default(),
        )
        .unwrap();
        let eight: Vec<&ChartBar> = scene.bars.iter().filter(|b| b.primary == "8").collect();
        assert_eq!(eight[0].secondary.as_deref(), Some("0"));
        assert_eq!(eight[0].stack_offset, 0.0);
        assert_eq!(eight[1].stack_offset, 12.0);
        assert_eq!(eight[1].top(), 14.0);
        assert_eq!(eight[0].fill, "#1f77b4");
        assert_eq!(eight[1].fill, "#ff7f0e");

        let legend = scene.legend.unwrap();
        assert_eq!(legend.title, "am");
        assert_eq!(legend.entries.len(), 2);
    }

    #[test]
    fn test_stacked_conditional_reaches_one() {
        let scene = plan(
            &cyl_by_am(AggregationMode::ConditionalProbability),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::Stacked,
            &LayoutOptions::default(),
        )
        .unwrap();
        for slot in 0..3 {
            let top = scene.slot_bars(slot).map(|b| b.top()).fold(0.0, f64::max);
            assert_float_eq!(top, 1.0, abs <= 1e-9);
        }
    }

    #[test]
    fn test_incompatible_arrangement() {
        let table = cyl_only(AggregationMode::Count);
        let opts = LayoutOptions::default();
        let res = plan(&table, OrderingPolicy::DatasetOrder, ArrangementPolicy::Stacked, &opts);
        assert!(matches!(res, Err(GramError::IncompatibleArrangement(_))));
        let res = plan(&table, OrderingPolicy::DatasetOrder, ArrangementPolicy::Dodged, &opts);
        assert!(matches!(res, Err(GramError::IncompatibleArrangement(_))));
    }

    #[test]
    fn test_invalid_options() {
        let table = cyl_only(AggregationMode::Count);
        let opts = LayoutOptions { bar_width: 1.5, ..Default::default() };
        let res = plan(&table, OrderingPolicy::DatasetOrder, ArrangementPolicy::None, &opts);
        assert!(matches!(res, Err(GramError::InvalidOptions(_))));

        let opts = LayoutOptions {
            axis_range: Some(AxisRange { min: 1.0, max: 0.0, step: None }),
            ..Default::default()
        };
        let res = plan(&table, OrderingPolicy::DatasetOrder, ArrangementPolicy::None, &opts);
        assert!(matches!(res, Err(GramError::InvalidOptions(_))));
    }

    #[test]
    fn test_percentage_labels_and_ticks() {
        let opts = LayoutOptions {
            value_format: ValueFormat::Percentage,
            show_value_labels: true,
            axis_range: Some(AxisRange { min: 0.0, max: 1.0, step: Some(0.25) }),
            ..Default::default()
        };
        let scene = plan(
            &cyl_only(AggregationMode::RelativeFrequency),
            OrderingPolicy::AscendingValue,
            ArrangementPolicy::None,
            &opts,
        )
        .unwrap();
        let labels: Vec<&str> = scene.bars.iter().filter_map(|b| b.label.as_deref()).collect();
        assert_eq!(labels, vec!["34%", "22%", "44%"]);
        assert_eq!(scene.value_axis.tick_labels, vec!["0%", "25%", "50%", "75%", "100%"]);
        assert_eq!(scene.value_axis.range, (0.0, 1.0));
    }

    #[test]
    fn test_quarter_step_ticks_keep_two_decimals() {
        let opts = LayoutOptions {
            axis_range: Some(AxisRange { min: 0.0, max: 1.0, step: Some(0.25) }),
            ..Default::default()
        };
        let scene = plan(
            &cyl_only(AggregationMode::RelativeFrequency),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::None,
            &opts,
        )
        .unwrap();
        assert_eq!(scene.value_axis.tick_labels, vec!["0.00", "0.25", "0.50", "0.75", "1.00"]);
    }

    #[test]
    fn test_fractional_percentage_step_ticks() {
        let opts = LayoutOptions {
            value_format: ValueFormat::Percentage,
            axis_range: Some(AxisRange { min: 0.0, max: 0.1, step: Some(0.025) }),
            ..Default::default()
        };
        let scene = plan(
            &cyl_only(AggregationMode::RelativeFrequency),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::None,
            &opts,
        )
        .unwrap();
        assert_eq!(scene.value_axis.tick_labels, vec!["0.0%", "2.5%", "5.0%", "7.5%", "10.0%"]);
    }

    #[test]
    fn test_tick_decimals() {
        assert_eq!(tick_decimals(&[0.0, 5.0], ValueFormat::Raw), 0);
        assert_eq!(tick_decimals(&[0.0, 0.2], ValueFormat::Raw), 1);
        assert_eq!(tick_decimals(&[0.0, 0.05], ValueFormat::Raw), 2);
        assert_eq!(tick_decimals(&[0.0, 0.125], ValueFormat::Raw), 3);
        assert_eq!(tick_decimals(&[0.0, 0.1], ValueFormat::Percentage), 0);
        assert_eq!(tick_decimals(&[0.0], ValueFormat::Raw), 0);
    }

    #[test]
    fn test_raw_probability_labels_use_two_decimals() {
        let opts = LayoutOptions { show_value_labels: true, ..Default::default() };
        let scene = plan(
            &cyl_by_am(AggregationMode::ConditionalProbability),
            OrderingPolicy::AscendingValue,
            ArrangementPolicy::Dodged,
            &opts,
        )
        .unwrap();
        assert_eq!(scene.bars[0].label.as_deref(), Some("0.27"));
        assert_eq!(scene.bars[1].label.as_deref(), Some("0.73"));
    }

    #[test]
    fn test_count_labels() {
        let opts = LayoutOptions { show_value_labels: true, ..Default::default() };
        let scene = plan(
            &cyl_only(AggregationMode::Count),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::None,
            &opts,
        )
        .unwrap();
        assert_eq!(scene.bars[0].label.as_deref(), Some("7"));
        assert_eq!(scene.value_axis.title, "count");
        assert_eq!(scene.primary_axis.title, "cyl");
    }

    #[test]
    fn test_labels_and_flip() {
        let mut opts = LayoutOptions { flip: true, fill: Some("steelblue".into()), ..Default::default() };
        opts.labels.x = Some("Cylinders".into());
        opts.labels.title = Some("Cars".into());
        let scene = plan(
            &cyl_only(AggregationMode::Count),
            OrderingPolicy::DatasetOrder,
            ArrangementPolicy::None,
            &opts,
        )
        .unwrap();
        assert!(scene.flipped);
        assert_eq!(scene.title.as_deref(), Some("Cars"));
        assert_eq!(scene.primary_axis.title, "Cylinders");
        assert!(scene.bars.iter().all(|b| b.fill == "steelblue"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.34375, ValueFormat::Percentage, 0), "34%");
        assert_eq!(format_value(0.34375, ValueFormat::Percentage, 1), "34.4%");
        assert_eq!(format_value(0.2727, ValueFormat::Raw, 2), "0.27");
        assert_eq!(format_value(11.0, ValueFormat::Raw, 0), "11");
    }

    #[test]
    fn test_policies_from_str() {
        assert_eq!("desc_freq".parse::<OrderingPolicy>(), Ok(OrderingPolicy::DescendingFrequency));
        assert_eq!("dodge".parse::<ArrangementPolicy>(), Ok(ArrangementPolicy::Dodged));
        assert!("sideways".parse::<ArrangementPolicy>().is_err());
    }
}
