// Geometry (geom) parser for the bar-chart DSL

use super::ast::BarLayer;
use super::lexer::{boolean_literal, number_literal, string_literal, ws};
use crate::aggregate::AggregationMode;
use crate::layout::{ArrangementPolicy, OrderingPolicy};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_res, verify},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

#[derive(Debug, Clone)]
enum ArgValue {
    Stat(AggregationMode),
    Position(ArrangementPolicy),
    Order(OrderingPolicy),
    Number(f64),
    String(String),
    Bool(bool),
}

/// Parse a bar geometry
/// Format: bar() or bar(stat: "conditional", position: "dodge", order: "desc_freq", ...)
pub fn parse_bar(input: &str) -> IResult<&str, BarLayer> {
    let (input, _) = ws(tag("bar"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    // Enumerated options must name a known variant, otherwise the layer fails to parse
    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(
                preceded(
                    ws(tag("stat:")),
                    map_res(ws(string_literal), |s: String| s.parse::<AggregationMode>()),
                ),
                |v| ("stat", ArgValue::Stat(v)),
            ),
            map(
                preceded(
                    ws(tag("position:")),
                    map_res(ws(string_literal), |s: String| s.parse::<ArrangementPolicy>()),
                ),
                |v| ("position", ArgValue::Position(v)),
            ),
            map(
                preceded(
                    ws(tag("order:")),
                    map_res(ws(string_literal), |s: String| s.parse::<OrderingPolicy>()),
                ),
                |v| ("order", ArgValue::Order(v)),
            ),
            map(preceded(ws(tag("width:")), ws(number_literal)), |v| ("width", ArgValue::Number(v))),
            map(preceded(ws(tag("fill:")), ws(string_literal)), |v| ("fill", ArgValue::String(v))),
            map(preceded(ws(tag("alpha:")), ws(number_literal)), |v| ("alpha", ArgValue::Number(v))),
            map(preceded(ws(tag("labels:")), ws(boolean_literal)), |v| ("labels", ArgValue::Bool(v))),
            map(
                preceded(
                    ws(tag("digits:")),
                    ws(verify(number_literal, |n: &f64| *n >= 0.0 && n.fract() == 0.0)),
                ),
                |v| ("digits", ArgValue::Number(v)),
            ),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut layer = BarLayer::default();
    for (key, val) in args {
        match (key, val) {
            ("stat", ArgValue::Stat(v)) => layer.stat = Some(v),
            ("position", ArgValue::Position(v)) => layer.position = Some(v),
            ("order", ArgValue::Order(v)) => layer.order = Some(v),
            ("width", ArgValue::Number(v)) => layer.width = Some(v),
            ("fill", ArgValue::String(v)) => layer.fill = Some(v),
            ("alpha", ArgValue::Number(v)) => layer.alpha = Some(v),
            ("labels", ArgValue::Bool(v)) => layer.labels = v,
            ("digits", ArgValue::Number(v)) => layer.digits = Some(v as usize),
            _ => {}
        }
    }

    Ok((input, layer))
}
