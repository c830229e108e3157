use anyhow::Result;
use crate::aggregate::AggregationMode;
use crate::data::Dataset;
use crate::ir::ChartRequest;
use crate::layout::{ArrangementPolicy, LayoutOptions, OrderingPolicy};
use crate::parser::ast::{CoordSystem, Labels, PlotSpec};

/// Resolve a parsed plot specification into a typed chart request,
/// checking the mapped attributes against the dataset schema.
/// Settings the DSL leaves unset fall back to `base`.
pub fn resolve_chart_request(
    spec: &PlotSpec,
    data: &Dataset,
    base: &LayoutOptions,
) -> Result<ChartRequest> {
    let aes = match &spec.aesthetics {
        Some(aes) => aes,
        None => anyhow::bail!("No x aesthetic specified (use aes(x: ...))"),
    };

    for col in std::iter::once(&aes.x).chain(aes.fill.iter()) {
        if data.column_index(col).is_none() {
            anyhow::bail!(
                "Column '{}' not found (available: {})",
                col,
                data.headers().join(", ")
            );
        }
    }

    let bar = &spec.bar;
    let mode = bar.stat.unwrap_or(AggregationMode::Count);

    // Grouped bars stack unless told otherwise
    let arrangement = bar.position.unwrap_or(if aes.fill.is_some() {
        ArrangementPolicy::Stacked
    } else {
        ArrangementPolicy::None
    });

    let scale = spec.y_scale.clone().unwrap_or_default();
    let labels = spec.labels.clone().unwrap_or_default();
    let layout = LayoutOptions {
        bar_width: bar.width.unwrap_or(base.bar_width),
        value_format: scale.format.unwrap_or(base.value_format),
        precision: bar.digits.or(base.precision),
        show_value_labels: bar.labels || base.show_value_labels,
        axis_range: scale.limits.or(base.axis_range),
        flip: match spec.coord {
            Some(CoordSystem::Flip) => true,
            Some(CoordSystem::Cartesian) => false,
            None => base.flip,
        },
        fill: bar.fill.clone().or_else(|| base.fill.clone()),
        alpha: bar.alpha.unwrap_or(base.alpha),
        labels: Labels {
            title: labels.title.or_else(|| base.labels.title.clone()),
            x: labels.x.or_else(|| base.labels.x.clone()),
            y: labels.y.or_else(|| base.labels.y.clone()),
            fill: labels.fill.or_else(|| base.labels.fill.clone()),
        },
    };

    Ok(ChartRequest {
        primary: aes.x.clone(),
        secondary: aes.fill.clone(),
        mode,
        ordering: bar.order.unwrap_or(OrderingPolicy::DatasetOrder),
        arrangement,
        layout,
    })
}
