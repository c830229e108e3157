// Pipeline parser for the bar-chart DSL

use super::aesthetics::parse_aesthetics;
use super::ast::{Aesthetics, AxisScale, BarLayer, CoordSystem, Labels, PlotSpec};
use super::coord::parse_coord;
use super::geom::parse_bar;
use super::labels::parse_labs;
use super::lexer::ws;
use super::scale::parse_scale_command;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map, opt},
    error::{Error, ErrorKind},
    multi::separated_list0,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Aes(Aesthetics),
    Bar(BarLayer),
    Coord(CoordSystem),
    Labels(Labels),
    Scale(AxisScale),
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((
        map(parse_aesthetics, PipelineComponent::Aes),
        map(parse_bar, PipelineComponent::Bar),
        map(parse_coord, PipelineComponent::Coord),
        map(parse_labs, PipelineComponent::Labels),
        map(parse_scale_command, PipelineComponent::Scale),
    ))(input)
}

/// Parse a complete plot specification
/// Format: component | component | ...
pub fn parse_plot_spec(input: &str) -> IResult<&str, PlotSpec> {
    // Optional: consume leading "df"
    let (input, _) = opt(ws(tag("df")))(input)?;

    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(
        ws(tag("|")),
        parse_pipeline_component
    )(input)?;

    let (input, _) = ws(eof)(input)?;

    let mut aesthetics = None;
    let mut bar = None;
    let mut coord = None;
    let mut labels: Option<Labels> = None;
    let mut y_scale: Option<AxisScale> = None;

    for comp in components {
        match comp {
            PipelineComponent::Aes(a) => aesthetics = Some(a),
            PipelineComponent::Bar(b) => {
                // A chart holds exactly one bar layer
                if bar.is_some() {
                    return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify)));
                }
                bar = Some(b);
            }
            PipelineComponent::Coord(c) => coord = Some(c),
            PipelineComponent::Labels(l) => {
                // Later labs() calls fill in what earlier ones left unset
                let merged = match labels.take() {
                    Some(prev) => Labels {
                        title: l.title.or(prev.title),
                        x: l.x.or(prev.x),
                        y: l.y.or(prev.y),
                        fill: l.fill.or(prev.fill),
                    },
                    None => l,
                };
                labels = Some(merged);
            }
            PipelineComponent::Scale(s) => {
                let mut merged = y_scale.take().unwrap_or_default();
                if s.format.is_some() {
                    merged.format = s.format;
                }
                if s.limits.is_some() {
                    merged.limits = s.limits;
                }
                y_scale = Some(merged);
            }
        }
    }

    let bar = match bar {
        Some(b) => b,
        None => return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    };

    Ok((
        input,
        PlotSpec {
            aesthetics,
            bar,
            labels,
            coord,
            y_scale,
        },
    ))
}
