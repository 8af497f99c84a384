//! Query Abstract Syntax Tree
//!
//! Expressions of the series DSL. Everything evaluated at top level is a
//! function call; string literals and bare identifiers name series.
//!
//! # Example Expressions
//!
//! ```text
//! group("servers.web1.cpu.user")
//! group(alias("servers.*.cpu.user", "cpu"))
//! group(aliasByNode("servers.{web1,web2}.mem.used", 1))
//! ```

/// A parsed DSL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Function call: `name(arg, ...)`
    Call { name: String, args: Vec<Expr> },
    /// Quoted string literal
    Str(String),
    /// Numeric literal
    Number(f64),
    /// Bare identifier not followed by `(`
    Ident(String),
}

impl Expr {
    /// Create a call expression
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// Short description used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Call { .. } => "function call",
            Expr::Str(_) => "string",
            Expr::Number(_) => "number",
            Expr::Ident(_) => "identifier",
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Str(s) => write!(f, "{:?}", s),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Ident(i) => write!(f, "{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrips_shape() {
        let expr = Expr::call(
            "group",
            vec![
                Expr::Str("a.b".to_string()),
                Expr::call("alias", vec![Expr::Ident("x".to_string()), Expr::Number(2.5)]),
            ],
        );
        assert_eq!(expr.to_string(), r#"group("a.b", alias(x, 2.5))"#);
    }

    #[test]
    fn test_kind() {
        assert_eq!(Expr::Number(1.0).kind(), "number");
        assert_eq!(Expr::call("f", vec![]).kind(), "function call");
    }
}
