//! Query Parser
//!
//! Parses series DSL strings into `Expr` trees.
//!
//! # Supported Syntax
//!
//! ```text
//! expr   := call | string | number | ident
//! call   := ident '(' [expr (',' expr)*] ')'
//! string := '"' ... '"' | '\'' ... '\''     (backslash escapes)
//! ident  := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! # Examples
//!
//! ```text
//! group("servers.web1.cpu")
//! alias(group("a.*", "b.*"), 'total')
//! aliasByNode("servers.*.cpu", 1, -1)
//! ```

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::query::ast::Expr;
use crate::query::error::{QueryError, QueryResult};

/// Parse a DSL string into an expression tree
pub fn parse_expr(input: &str) -> QueryResult<Expr> {
    match delimited(multispace0, parse_expression, multispace0)(input) {
        Ok((remaining, expr)) => {
            if remaining.is_empty() {
                Ok(expr)
            } else {
                Err(QueryError::Parse(format!(
                    "Unexpected input after expression: '{}'",
                    remaining
                )))
            }
        }
        Err(e) => Err(QueryError::Parse(format!("Invalid expression {:?}: {}", input, e))),
    }
}

/// Parse any expression
fn parse_expression(input: &str) -> IResult<&str, Expr> {
    alt((
        parse_call,
        map(parse_string, Expr::Str),
        map(parse_number, Expr::Number),
        map(parse_identifier, |s| Expr::Ident(s.to_string())),
    ))(input)
}

/// Parse a function call like `alias(x, "y")`
fn parse_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        terminated(char('('), multispace0),
        separated_list0(
            delimited(multispace0, char(','), multispace0),
            parse_expression,
        ),
        preceded(multispace0, char(')')),
    )(input)?;

    Ok((input, Expr::call(name, args)))
}

/// Parse a single- or double-quoted string
fn parse_string(input: &str) -> IResult<&str, String> {
    alt((quoted('"'), quoted('\'')))(input)
}

fn quoted(quote: char) -> impl FnMut(&str) -> IResult<&str, String> {
    move |input| {
        let stop: &str = if quote == '"' { "\"\\" } else { "'\\" };
        let (input, _) = char(quote)(input)?;
        let (input, content) = opt(escaped_transform(
            is_not(stop),
            '\\',
            alt((
                value("\\", char('\\')),
                value("\"", char('"')),
                value("'", char('\'')),
                value("\n", char('n')),
                value("\t", char('t')),
            )),
        ))(input)?;
        let (input, _) = char(quote)(input)?;
        Ok((input, content.unwrap_or_default()))
    }
}

/// Parse identifier (function name or bare series name)
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse floating point number
fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Expr {
        Expr::Str(v.to_string())
    }

    #[test]
    fn test_parse_group_of_string() {
        let expr = parse_expr(r#"group("servers.web1.cpu")"#).unwrap();
        assert_eq!(expr, Expr::call("group", vec![s("servers.web1.cpu")]));
    }

    #[test]
    fn test_parse_nested_calls() {
        let expr = parse_expr(r#"group(alias("a.*", 'total'), "b.c")"#).unwrap();
        assert_eq!(
            expr,
            Expr::call(
                "group",
                vec![Expr::call("alias", vec![s("a.*"), s("total")]), s("b.c")]
            )
        );
    }

    #[test]
    fn test_parse_numbers_and_identifiers() {
        let expr = parse_expr("aliasByNode(cpu, 1, -2, 0.5)").unwrap();
        assert_eq!(
            expr,
            Expr::call(
                "aliasByNode",
                vec![
                    Expr::Ident("cpu".to_string()),
                    Expr::Number(1.0),
                    Expr::Number(-2.0),
                    Expr::Number(0.5),
                ]
            )
        );
    }

    #[test]
    fn test_parse_whitespace() {
        let expr = parse_expr("  group ( \"a.b\" ,  \"c.d\" )  ").unwrap();
        assert_eq!(expr, Expr::call("group", vec![s("a.b"), s("c.d")]));
    }

    #[test]
    fn test_parse_empty_call_and_string() {
        assert_eq!(parse_expr("group()").unwrap(), Expr::call("group", vec![]));
        assert_eq!(parse_expr(r#""""#).unwrap(), s(""));
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse_expr(r#""a\"b""#).unwrap(), s("a\"b"));
        assert_eq!(parse_expr(r"'it\'s'").unwrap(), s("it's"));
    }

    #[test]
    fn test_parse_value_set_literal() {
        let expr = parse_expr(r#"group("host.{web,db}.cpu")"#).unwrap();
        assert_eq!(expr, Expr::call("group", vec![s("host.{web,db}.cpu")]));
    }

    #[test]
    fn test_parse_error_unquoted_dotted() {
        assert!(matches!(
            parse_expr("group(servers.web1)"),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_error_trailing_input() {
        assert!(matches!(parse_expr("group() x"), Err(QueryError::Parse(_))));
        assert!(matches!(parse_expr("group("), Err(QueryError::Parse(_))));
    }
}
