// Aesthetics parser for the bar-chart DSL

use super::ast::Aesthetics;
use super::lexer::{identifier, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    error::{Error, ErrorKind},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

/// Parse aesthetics specification
/// Format: aes(x: col) or aes(x: col, fill: col), in any order
pub fn parse_aesthetics(input: &str) -> IResult<&str, Aesthetics> {
    let (input, _) = ws(tag("aes"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list1(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(identifier)), |v| ("x", v)),
            map(preceded(ws(tag("fill:")), ws(identifier)), |v| ("fill", v)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut x = None;
    let mut fill = None;
    for (key, val) in args {
        match key {
            "x" => x = Some(val),
            "fill" => fill = Some(val),
            _ => {}
        }
    }

    match x {
        Some(x) => Ok((input, Aesthetics { x, fill })),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aesthetics() {
        let (_, aes) = parse_aesthetics("aes(x: cyl)").unwrap();
        assert_eq!(aes.x, "cyl");
        assert_eq!(aes.fill, None);
    }

    #[test]
    fn test_parse_aesthetics_with_fill() {
        let (_, aes) = parse_aesthetics("  aes( fill: am , x: cyl )  ").unwrap();
        assert_eq!(aes.x, "cyl");
        assert_eq!(aes.fill, Some("am".to_string()));
    }

    #[test]
    fn test_parse_aesthetics_missing_x() {
        assert!(parse_aesthetics("aes(fill: am)").is_err());
    }

    #[test]
    fn test_parse_aesthetics_missing_comma() {
        assert!(parse_aesthetics("aes(x: cyl fill: am)").is_err());
    }

    #[test]
    fn test_parse_aesthetics_unclosed_paren() {
        assert!(parse_aesthetics("aes(x: cyl").is_err());
    }
}
