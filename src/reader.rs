use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut},
    error::ErrorKind,
    multi::many0,
    number::complete::recognize_float,
    sequence::preceded,
};

use crate::ast::{Datum, NumberType};
use crate::config::Config;
use crate::stack::ensure_sufficient_stack;
use crate::{Error, UnbalancedKind};

/// Characters that end an atom. Everything else is part of one.
fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | ' ' | '\t' | '\n' | '\r')
}

/// Classify a raw token: number first, then quoted string, otherwise symbol
pub(crate) fn classify_atom(token: &str) -> Datum {
    if let Some(n) = number_literal(token) {
        Datum::Number(n)
    } else if let Some(s) = string_literal(token) {
        Datum::Str(s.to_owned())
    } else {
        Datum::Symbol(token.to_owned())
    }
}

/// The whole token must be a decimal float (`42`, `-1.5`, `.5`, `6e-3`)
fn number_literal(token: &str) -> Option<NumberType> {
    let (_, digits) = all_consuming(recognize_float::<&str, nom::error::Error<&str>>)
        .parse(token)
        .ok()?;
    digits.parse().ok()
}

/// `"text"` or `'text'`; quotes are stripped, nothing is unescaped
fn string_literal(token: &str) -> Option<&str> {
    let mut chars = token.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if matches!(first, '"' | '\'') && first == last {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

fn parse_atom(input: &str) -> IResult<&str, Datum> {
    let (input, token) = take_till1(is_delimiter).parse(input)?;
    Ok((input, classify_atom(token)))
}

fn parse_list(input: &str, depth: usize, max_depth: usize) -> IResult<&str, Datum> {
    let (input, _) = char('(').parse(input)?;
    if depth >= max_depth {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }

    let (input, items) = many0(preceded(multispace0, |input| {
        parse_datum(input, depth + 1, max_depth)
    }))
    .parse(input)?;

    // Nothing but ')' or end of input can follow the items, so a missing ')'
    // means the text ran out inside this list
    let (input, _) = cut(preceded(multispace0, char(')'))).parse(input)?;

    Ok((input, Datum::List(items)))
}

fn parse_datum(input: &str, depth: usize, max_depth: usize) -> IResult<&str, Datum> {
    ensure_sufficient_stack(|| {
        alt((|input| parse_list(input, depth, max_depth), parse_atom)).parse(input)
    })
}

/// Parse program text into its top-level forms using default limits
pub fn parse(input: &str) -> Result<Vec<Datum>, Error> {
    parse_with_config(input, &Config::default())
}

/// Parse program text into its top-level forms.
///
/// A bare atom at top level is a form of its own. Unclosed lists and stray
/// closing parentheses are [`Error::UnbalancedInput`]; lists nested deeper than
/// `config.max_parse_depth` are [`Error::RecursionLimitExceeded`].
pub fn parse_with_config(input: &str, config: &Config) -> Result<Vec<Datum>, Error> {
    let max_depth = config.max_parse_depth;
    let result = many0(preceded(multispace0, |input| {
        parse_datum(input, 0, max_depth)
    }))
    .parse(input);

    let (remaining, forms) = match result {
        Ok(parsed) => parsed,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(match e.code {
                ErrorKind::TooLarge => Error::RecursionLimitExceeded { limit: max_depth },
                _ => Error::unbalanced(
                    UnbalancedKind::Unclosed,
                    input,
                    input.len() - e.input.len(),
                ),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(Error::unbalanced(
                UnbalancedKind::Unclosed,
                input,
                input.len(),
            ));
        }
    };

    let remaining = remaining.trim_start_matches([' ', '\t', '\n', '\r']);
    if !remaining.is_empty() {
        // Only a ')' stops the top-level loop early
        return Err(Error::unbalanced(
            UnbalancedKind::UnexpectedClose,
            input,
            input.len() - remaining.len(),
        ));
    }

    Ok(forms)
}
