use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::value,
    sequence::terminated,
    IResult,
};
use crate::parser::ast::CoordSystem;
use crate::parser::lexer::ws;

/// Parse coord_flip() or coord_cartesian()
pub fn parse_coord(input: &str) -> IResult<&str, CoordSystem> {
    let (input, coord) = ws(alt((
        value(CoordSystem::Flip, tag("coord_flip")),
        value(CoordSystem::Cartesian, tag("coord_cartesian")),
    )))(input)?;
    let (input, _) = terminated(ws(char('(')), ws(char(')')))(input)?;

    Ok((input, coord))
}
