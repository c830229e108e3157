use crate::data::Dataset;
use crate::error::{GramError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What each aggregated cell measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Number of records per category
    Count,
    /// Count divided by the total record count
    RelativeFrequency,
    /// Share of all records in each (primary, secondary) combination
    JointProbability,
    /// Share of each primary partition falling into each secondary value
    ConditionalProbability,
}

impl AggregationMode {
    pub fn requires_secondary(&self) -> bool {
        matches!(
            self,
            AggregationMode::JointProbability | AggregationMode::ConditionalProbability
        )
    }

    pub fn is_probability(&self) -> bool {
        !matches!(self, AggregationMode::Count)
    }

    /// Default value-axis title
    pub fn axis_title(&self) -> &'static str {
        match self {
            AggregationMode::Count => "count",
            AggregationMode::RelativeFrequency => "proportion",
            AggregationMode::JointProbability => "joint probability",
            AggregationMode::ConditionalProbability => "conditional probability",
        }
    }
}

impl FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregationMode::Count),
            "prop" | "relative" | "relative_frequency" => Ok(AggregationMode::RelativeFrequency),
            "joint" | "joint_probability" => Ok(AggregationMode::JointProbability),
            "cond" | "conditional" | "conditional_probability" => {
                Ok(AggregationMode::ConditionalProbability)
            }
            other => Err(format!("unknown stat '{}'", other)),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AggregationMode::Count => "count",
            AggregationMode::RelativeFrequency => "relative frequency",
            AggregationMode::JointProbability => "joint probability",
            AggregationMode::ConditionalProbability => "conditional probability",
        };
        write!(f, "{}", name)
    }
}

/// Attribute names selected for aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryKey {
    pub primary: String,
    pub secondary: Option<String>,
}

impl CategoryKey {
    pub fn new(primary: &str, secondary: Option<&str>) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.map(|s| s.to_string()),
        }
    }
}

/// One category combination and its aggregated value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedCell {
    pub primary: String,
    pub secondary: Option<String>,
    /// Number of records behind this cell
    pub count: usize,
    pub value: f64,
}

/// The derived table produced by `aggregate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTable {
    pub key: CategoryKey,
    pub mode: AggregationMode,
    pub total: usize,
    /// Primary categories in first-encountered dataset order
    pub primary_levels: Vec<String>,
    /// Secondary categories in canonical order (empty for single-key tables)
    pub secondary_levels: Vec<String>,
    pub cells: Vec<AggregatedCell>,
}

impl AggregatedTable {
    pub fn has_secondary(&self) -> bool {
        self.key.secondary.is_some()
    }

    pub fn get(&self, primary: &str, secondary: Option<&str>) -> Option<&AggregatedCell> {
        self.cells
            .iter()
            .find(|c| c.primary == primary && c.secondary.as_deref() == secondary)
    }

    /// Sum of values across every secondary group of one primary category
    pub fn primary_total(&self, primary: &str) -> f64 {
        self.cells
            .iter()
            .filter(|c| c.primary == primary)
            .map(|c| c.value)
            .sum()
    }

    pub fn value_sum(&self) -> f64 {
        self.cells.iter().map(|c| c.value).sum()
    }
}

/// Group, count and normalize the records of `dataset` by one or two attributes.
///
/// Joint probabilities are normalized over the whole dataset, conditional
/// probabilities within each primary partition.
pub fn aggregate(
    dataset: &Dataset,
    primary: &str,
    secondary: Option<&str>,
    mode: AggregationMode,
) -> Result<AggregatedTable> {
    let primary_idx = dataset.column_index(primary).ok_or_else(|| {
        GramError::InvalidAggregationRequest(format!("Attribute '{}' not found", primary))
    })?;

    let secondary_idx = match secondary {
        Some(name) => Some(dataset.column_index(name).ok_or_else(|| {
            GramError::InvalidAggregationRequest(format!("Attribute '{}' not found", name))
        })?),
        None => None,
    };

    if mode.requires_secondary() && secondary_idx.is_none() {
        return Err(GramError::InvalidAggregationRequest(format!(
            "{} requires a secondary attribute",
            mode
        )));
    }
    if mode == AggregationMode::RelativeFrequency && secondary_idx.is_some() {
        return Err(GramError::InvalidAggregationRequest(
            "relative frequency takes a single attribute; use joint probability for two".into(),
        ));
    }

    // Count combinations, remembering first-encountered primary order
    let mut counts: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut marginals: HashMap<String, usize> = HashMap::new();
    let mut primary_levels: Vec<String> = Vec::new();
    let mut secondary_levels: Vec<String> = Vec::new();

    for record in dataset.records() {
        let p = record
            .get(primary_idx)
            .map(|v| v.category_label())
            .unwrap_or_else(|| "NA".to_string());
        let s = secondary_idx.map(|idx| {
            record
                .get(idx)
                .map(|v| v.category_label())
                .unwrap_or_else(|| "NA".to_string())
        });

        if !marginals.contains_key(&p) {
            primary_levels.push(p.clone());
        }
        *marginals.entry(p.clone()).or_default() += 1;

        if let Some(s) = &s {
            if !secondary_levels.contains(s) {
                secondary_levels.push(s.clone());
            }
        }
        *counts.entry((p, s)).or_default() += 1;
    }
    sort_categories(&mut secondary_levels);

    let total = dataset.len();
    if mode.is_probability() && total == 0 {
        return Err(GramError::EmptyPartition(format!(
            "cannot compute {} over an empty dataset",
            mode
        )));
    }

    let mut cells = Vec::with_capacity(counts.len());
    for p in &primary_levels {
        let groups: Vec<Option<String>> = if secondary_idx.is_some() {
            secondary_levels.iter().cloned().map(Some).collect()
        } else {
            vec![None]
        };

        for s in groups {
            let count = match counts.get(&(p.clone(), s.clone())) {
                Some(&c) => c,
                None => continue,
            };

            let value = match mode {
                AggregationMode::Count => count as f64,
                AggregationMode::RelativeFrequency | AggregationMode::JointProbability => {
                    count as f64 / total as f64
                }
                AggregationMode::ConditionalProbability => {
                    let marginal = marginals.get(p).copied().unwrap_or(0);
                    if marginal == 0 {
                        return Err(GramError::EmptyPartition(format!(
                            "partition '{}' of '{}' has no records",
                            p, primary
                        )));
                    }
                    count as f64 / marginal as f64
                }
            };

            cells.push(AggregatedCell {
                primary: p.clone(),
                secondary: s,
                count,
                value,
            });
        }
    }

    Ok(AggregatedTable {
        key: CategoryKey::new(primary, secondary),
        mode,
        total,
        primary_levels,
        secondary_levels,
        cells,
    })
}

/// Canonical category order: numeric when every label is a number, lexicographic otherwise
pub fn sort_categories(categories: &mut [String]) {
    let all_numeric = categories.iter().all(|s| s.parse::<f64>().is_ok());
    if all_numeric {
        categories.sort_by(|a, b| {
            let fa = a.parse::<f64>().unwrap_or(f64::NAN);
            let fb = b.parse::<f64>().unwrap_or(f64::NAN);
            fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        categories.sort();
    }
}
