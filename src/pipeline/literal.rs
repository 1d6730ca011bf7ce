// literal.rs
// Permissive parser for literal structures that are not valid JSON:
// single- or double-quoted strings, None/True/False, tuples, trailing commas.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, map_res, opt, value},
    error::{Error, ErrorKind},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, preceded, separated_pair, terminated},
    Err, IResult,
};
use serde_json::{Map, Number, Value};
use thiserror::Error as ThisError;

/// The literal could not be parsed; `near` is the unparsed remainder.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("invalid literal near {near:?}")]
pub struct LiteralError {
    pub near: String,
}

/// Parse a whole literal into a JSON value.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    match all_consuming(delimited(multispace0, literal, multispace0))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(LiteralError {
            near: e.input.chars().take(32).collect(),
        }),
        Err(Err::Incomplete(_)) => Err(LiteralError {
            near: String::new(),
        }),
    }
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(dict, Value::Object),
        map(sequence('[', ']'), Value::Array),
        map(sequence('(', ')'), Value::Array),
        map(quoted, Value::String),
        keyword,
        number,
    ))(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn sequence(open: char, close: char) -> impl FnMut(&str) -> IResult<&str, Vec<Value>> {
    move |input| {
        delimited(
            terminated(char(open), multispace0),
            terminated(separated_list0(comma, literal), opt(comma)),
            preceded(multispace0, char(close)),
        )(input)
    }
}

fn dict(input: &str) -> IResult<&str, Map<String, Value>> {
    map(
        delimited(
            terminated(char('{'), multispace0),
            terminated(separated_list0(comma, entry), opt(comma)),
            preceded(multispace0, char('}')),
        ),
        |entries| entries.into_iter().collect(),
    )(input)
}

fn entry(input: &str) -> IResult<&str, (String, Value)> {
    separated_pair(key, delimited(multispace0, char(':'), multispace0), literal)(input)
}

// Numeric keys become their text form; JSON objects only have string keys.
fn key(input: &str) -> IResult<&str, String> {
    alt((quoted, map(recognize_float, str::to_owned)))(input)
}

fn keyword(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Null, alt((tag("None"), tag("null")))),
        value(Value::Bool(true), alt((tag("True"), tag("true")))),
        value(Value::Bool(false), alt((tag("False"), tag("false")))),
    ))(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map_res(recognize_float, |text: &str| -> Result<Value, &'static str> {
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Value::from(int));
            }
        }
        let float: f64 = text.parse().map_err(|_| "not a number")?;
        Number::from_f64(float)
            .map(Value::Number)
            .ok_or("non-finite number")
    })(input)
}

/// A quoted string in either quote style, with backslash escapes.
/// Unknown escapes keep their backslash.
fn quoted(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c @ ('\'' | '"'))) => c,
        _ => return Err(Err::Error(Error::new(input, ErrorKind::Char))),
    };

    let mut out = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == quote {
            return Ok((&input[idx + c.len_utf8()..], out));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' | '\'' | '"' => out.push(escaped),
            'x' | 'u' => {
                let digits = if escaped == 'x' { 2 } else { 4 };
                match hex_escape(&mut chars, digits) {
                    Some(decoded) => out.push(decoded),
                    None => return Err(Err::Error(Error::new(input, ErrorKind::Escaped))),
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Err(Err::Error(Error::new(input, ErrorKind::Escaped)))
}

fn hex_escape(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
    if hex.chars().count() != digits {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_single_quoted_records() {
        let input = "[{'id': 12, 'fullName': 'Иван Петров', 'startDate': None, 'isTeacher': False}]";
        assert_eq!(
            parse_literal(input).unwrap(),
            json!([{"id": 12, "fullName": "Иван Петров", "startDate": null, "isTeacher": false}])
        );
    }

    #[test]
    fn mixed_quotes_keep_apostrophes() {
        let input = r#"{'name': "O'Brien", 'role': 'lead'}"#;
        assert_eq!(
            parse_literal(input).unwrap(),
            json!({"name": "O'Brien", "role": "lead"})
        );
    }

    #[test]
    fn tuples_trailing_commas_and_nesting() {
        let input = "{'email': ('a@x.ru', 'b@x.ru',), 'status': [{'id': 1, 'code': 'ok',},], 7: 1.5e2}";
        assert_eq!(
            parse_literal(input).unwrap(),
            json!({
                "email": ["a@x.ru", "b@x.ru"],
                "status": [{"id": 1, "code": "ok"}],
                "7": 150.0
            })
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(
            parse_literal(r"'tab\there \'q\' \x41 Ж \d'").unwrap(),
            json!("tab\there 'q' A Ж \\d")
        );
    }

    #[test]
    fn empty_collections_and_whitespace() {
        assert_eq!(parse_literal("  [ ]  ").unwrap(), json!([]));
        assert_eq!(parse_literal("{}").unwrap(), json!({}));
        assert_eq!(parse_literal("''").unwrap(), json!(""));
    }

    #[test]
    fn rejects_unterminated_and_foreign_syntax() {
        assert!(parse_literal("[{'id': 1").is_err());
        assert!(parse_literal("'open").is_err());
        let err = parse_literal("{'d': datetime.date(2023, 1, 1)}").unwrap_err();
        assert!(err.to_string().contains("invalid literal"));
    }
}
