//! S-expression reader: turns source text into cell trees.
//!
//! The evaluation core consumes only already-built cell trees; this module
//! is the edge glue that builds them from text for the REPL and the tests.
//! It supports exactly the forms the value model can represent: integers,
//! doubles, symbols, parenthesized lists (built as nil-terminated cons
//! chains) and the `'x` quote shorthand.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, recognize},
    error::ErrorKind,
    multi::separated_list0,
    sequence::{pair, preceded, terminated},
};

use std::fmt;

use crate::MAX_READ_DEPTH;
use crate::cell::{Cell, CellRef, SYMBOL_SPECIAL_CHARS, is_valid_symbol};

/// A failure to turn source text into a cell tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub message: String,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ReadError {}

/// Read one complete expression from `input`.
///
/// Surrounding whitespace is allowed; anything else left over after the
/// expression is an error.
pub fn read(input: &str) -> Result<CellRef, ReadError> {
    let mut parser = preceded(
        multispace0,
        terminated(|i| parse_expr(i, 0), multispace0),
    );

    match parser.parse(input) {
        Ok(("", cell)) => Ok(cell),
        Ok((rest, _)) => Err(ReadError {
            message: format!("trailing content after expression: '{}'", snippet(rest)),
        }),
        Err(err) => Err(ReadError {
            message: describe(input, err),
        }),
    }
}

/// Convert nom failures into user-facing messages.
fn describe(input: &str, error: nom::Err<nom::error::Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            if e.code == ErrorKind::TooLarge {
                format!("expression nested deeper than {MAX_READ_DEPTH} levels")
            } else if position < input.len() {
                format!("invalid syntax near '{}'", snippet(&input[position..]))
            } else {
                "unexpected end of input".to_owned()
            }
        }
        nom::Err::Incomplete(_) => "incomplete input".to_owned(),
    }
}

fn snippet(rest: &str) -> String {
    rest.chars().take(10).collect()
}

fn parse_expr(input: &str, depth: usize) -> IResult<&str, CellRef> {
    if depth >= MAX_READ_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }

    alt((
        |i| parse_quoted(i, depth),
        |i| parse_list(i, depth),
        parse_double,
        parse_int,
        parse_symbol,
    ))
    .parse(input)
}

/// `'x` desugars to `(quote x)`.
fn parse_quoted(input: &str, depth: usize) -> IResult<&str, CellRef> {
    let (input, _) = char('\'').parse(input)?;
    let (input, content) = parse_expr(input, depth + 1)?;

    let quoted = Cell::cons(
        Cell::symbol("quote"),
        Cell::cons(content, Cell::nil()),
    );
    Ok((input, quoted))
}

fn parse_list(input: &str, depth: usize) -> IResult<&str, CellRef> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, elements) =
        separated_list0(multispace1, |i| parse_expr(i, depth + 1)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char(')').parse(input)?;

    let mut list = Cell::nil();
    for element in elements.into_iter().rev() {
        list = Cell::cons(element, list);
    }
    Ok((input, list))
}

/// `digits.digits` with an optional leading minus.
fn parse_double(input: &str) -> IResult<&str, CellRef> {
    let (rest, text) = recognize((
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
        char('.'),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;

    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Cell::double(value))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Float,
        ))),
    }
}

fn parse_int(input: &str) -> IResult<&str, CellRef> {
    let (rest, text) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;

    match text.parse::<i64>() {
        Ok(value) => Ok((rest, Cell::int(value))),
        // Out-of-range literals are rejected rather than wrapped.
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

fn parse_symbol(input: &str) -> IResult<&str, CellRef> {
    let (rest, candidate) =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
            .parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((rest, Cell::symbol(candidate)))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_ok(input: &str) -> CellRef {
        read(input).unwrap_or_else(|err| panic!("read failed for '{input}': {err}"))
    }

    #[test]
    fn reads_atoms() {
        assert_eq!(*read_ok("42"), Cell::Int(42));
        assert_eq!(*read_ok("-17"), Cell::Int(-17));
        assert_eq!(*read_ok("3.25"), Cell::Double(3.25));
        assert_eq!(*read_ok("-0.5"), Cell::Double(-0.5));
        assert_eq!(*read_ok("foo"), Cell::Symbol("foo".to_owned()));
        assert_eq!(*read_ok("<"), Cell::Symbol("<".to_owned()));
        assert_eq!(*read_ok("-"), Cell::Symbol("-".to_owned()));
        assert_eq!(*read_ok("list?"), Cell::Symbol("list?".to_owned()));
    }

    #[test]
    fn reads_lists_as_cons_chains() {
        assert_eq!(read_ok("()").sexpr().unwrap(), "()");
        assert_eq!(read_ok("(1 2 3)").sexpr().unwrap(), "(1 2 3)");
        assert_eq!(read_ok("(+ 1 (* 2 3))").sexpr().unwrap(), "(+ 1 (* 2 3))");
        assert_eq!(read_ok("( 1  2 )").sexpr().unwrap(), "(1 2)");

        let pair = read_ok("(1 2)");
        assert_eq!(pair.car().unwrap().as_int().unwrap(), 1);
        assert_eq!(
            pair.cdr().unwrap().car().unwrap().as_int().unwrap(),
            2
        );
        assert!(pair.cdr().unwrap().cdr().unwrap().is_nil());
    }

    #[test]
    fn quote_shorthand_desugars() {
        assert_eq!(read_ok("'x").sexpr().unwrap(), "(quote x)");
        assert_eq!(read_ok("'(1 2)").sexpr().unwrap(), "(quote (1 2))");
        assert_eq!(read_ok("''x").sexpr().unwrap(), "(quote (quote x))");
    }

    #[test]
    fn whitespace_around_expression_is_ignored() {
        assert_eq!(read_ok("  42  ").sexpr().unwrap(), "42");
        assert_eq!(read_ok("\n(+ 1 2)\n").sexpr().unwrap(), "(+ 1 2)");
    }

    #[test]
    fn trailing_content_is_rejected() {
        let err = read("42 43").unwrap_err();
        assert!(err.message.contains("trailing content"), "{err}");

        let err = read("(+ 1 2))").unwrap_err();
        assert!(err.message.contains("trailing content"), "{err}");
    }

    #[test]
    fn unbalanced_and_empty_input_are_rejected() {
        assert!(read("(").is_err());
        assert!(read("(1 2").is_err());
        assert!(read("").is_err());
        assert!(read("'").is_err());
    }

    #[test]
    fn integer_overflow_is_rejected() {
        assert!(read("9223372036854775807").is_ok());
        assert!(read("99999999999999999999").is_err());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let deep_ok = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(read(&deep_ok).is_ok());

        let too_deep = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let err = read(&too_deep).unwrap_err();
        assert!(err.message.contains("nested deeper"), "{err}");
    }

    #[test]
    fn invalid_symbols_are_not_atoms() {
        // "-1abc" starts like a number but is neither number nor symbol.
        assert!(read("-1abc").is_err());
    }
}
