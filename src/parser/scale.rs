use nom::{
    bytes::complete::tag,
    character::complete::char,
    branch::alt,
    combinator::opt,
    sequence::preceded,
    IResult,
};
use crate::layout::{AxisRange, ValueFormat};
use crate::parser::ast::AxisScale;
use crate::parser::lexer::{number_literal, ws};

/// scale_y_percent(): show values and ticks as percentages
pub fn parse_scale_y_percent(input: &str) -> IResult<&str, AxisScale> {
    let (input, _) = ws(tag("scale_y_percent"))(input)?;
    let (input, _) = preceded(ws(char('(')), ws(char(')')))(input)?;
    Ok((input, AxisScale { format: Some(ValueFormat::Percentage), limits: None }))
}

/// ylim(min, max) or ylim(min, max, step)
pub fn parse_ylim(input: &str) -> IResult<&str, AxisScale> {
    let (input, _) = ws(tag("ylim"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, min) = ws(number_literal)(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, max) = ws(number_literal)(input)?;
    let (input, step) = opt(preceded(ws(char(',')), ws(number_literal)))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, AxisScale { format: None, limits: Some(AxisRange { min, max, step }) }))
}

pub fn parse_scale_command(input: &str) -> IResult<&str, AxisScale> {
    alt((parse_scale_y_percent, parse_ylim))(input)
}
