// Runtime executor for the bar-chart DSL

use crate::aggregate::{aggregate, AggregatedTable};
use crate::data::Dataset;
use crate::graph::Canvas;
use crate::ir::{ChartRequest, ChartScene};
use crate::layout::{plan, LayoutOptions};
use crate::parser::{self, PlotSpec};
use crate::resolve::resolve_chart_request;
use crate::table::{default_precision, format_table};
use crate::ChartConfig;
use anyhow::{Context, Result};
use log::{debug, info};

/// Parse a complete DSL string; the parser consumes it through end of input
pub fn parse_dsl(dsl: &str) -> Result<PlotSpec> {
    match parser::parse_plot_spec(dsl) {
        Ok((_, spec)) => Ok(spec),
        Err(e) => anyhow::bail!("Parse error: {:?}", e),
    }
}

/// Resolve the DSL against a dataset and aggregate the mapped attributes
fn prepare(dsl: &str, data: &Dataset, base: &LayoutOptions) -> Result<(ChartRequest, AggregatedTable)> {
    let spec = parse_dsl(dsl)?;
    let request = resolve_chart_request(&spec, data, base)?;
    debug!(
        "resolved request: primary={} secondary={:?} mode={} arrangement={:?}",
        request.primary, request.secondary, request.mode, request.arrangement
    );

    let table = aggregate(data, &request.primary, request.secondary.as_deref(), request.mode)
        .context("Failed to aggregate data")?;
    info!(
        "aggregated {} records into {} cells",
        data.len(),
        table.cells.len()
    );
    Ok((request, table))
}

/// Aggregate and lay out a chart, without drawing it
pub fn build_scene(dsl: &str, data: &Dataset, base: &LayoutOptions) -> Result<ChartScene> {
    let (request, table) = prepare(dsl, data, base)?;
    let scene = plan(&table, request.ordering, request.arrangement, &request.layout)
        .context("Failed to lay out chart")?;
    debug!("planned {} bars", scene.bars.len());
    Ok(scene)
}

/// Aggregate the mapped attributes and format them as a text table
pub fn tabulate(dsl: &str, data: &Dataset, base: &LayoutOptions) -> Result<String> {
    let (request, table) = prepare(dsl, data, base)?;
    let precision = request
        .layout
        .precision
        .unwrap_or_else(|| default_precision(table.mode));
    Ok(format_table(&table, precision))
}

/// Render a chart to encoded image bytes
pub fn render_chart(dsl: &str, data: &Dataset, config: &ChartConfig) -> Result<Vec<u8>> {
    let scene = build_scene(dsl, data, &config.layout)?;
    let canvas = Canvas::new(&config.render)?;
    let bytes = canvas.render(&scene).context("Failed to render chart")?;
    info!("rendered {:?} chart ({} bytes)", config.render.format, bytes.len());
    Ok(bytes)
}
