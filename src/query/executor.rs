//! Query Executor
//!
//! Evaluates DSL expressions against a `SeriesFetcher`:
//! 1. Parse the query text
//! 2. Resolve series selectors through tree lookup
//! 3. Open one cursor per matching leaf
//! 4. Apply naming functions
//!
//! # Execution Pipeline
//!
//! ```text
//! Query text → Expr → find(pattern) → fetch(leaf) → SeriesCollection
//! ```
//!
//! # Functions
//!
//! - `group(a, b, ...)`: union of the argument results, first name wins
//! - `alias(series, "label")`: display every series as `label`
//! - `aliasByNode(series, n, ...)`: display as the selected path segments

use chrono::{DateTime, Utc};

use crate::query::ast::Expr;
use crate::query::error::{QueryError, QueryResult};
use crate::query::parser::parse_expr;
use crate::storage::{SeriesCollection, SeriesFetcher, SeriesHandle};

/// Evaluation entry point of a series query engine
pub trait QueryEngine: Send + Sync {
    /// Evaluate `query` over `[from, until]`, reading data from `fetcher`
    fn evaluate(
        &self,
        fetcher: &dyn SeriesFetcher,
        query: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        max_points: i64,
    ) -> QueryResult<SeriesCollection>;
}

/// Engine for the function-call series DSL
#[derive(Debug, Default, Clone, Copy)]
pub struct DslEngine;

impl DslEngine {
    pub fn new() -> Self {
        Self
    }
}

impl QueryEngine for DslEngine {
    fn evaluate(
        &self,
        fetcher: &dyn SeriesFetcher,
        query: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        max_points: i64,
    ) -> QueryResult<SeriesCollection> {
        let expr = parse_expr(query)?;
        if !matches!(expr, Expr::Call { .. }) {
            return Err(QueryError::NotACall(expr.kind().to_string()));
        }

        let ctx = EvalContext {
            fetcher,
            from,
            until,
            max_points,
        };
        let result = ctx.eval(&expr)?;

        tracing::debug!(query = %query, series = result.len(), "Evaluated query");
        Ok(result)
    }
}

/// Per-evaluation state
struct EvalContext<'a> {
    fetcher: &'a dyn SeriesFetcher,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    max_points: i64,
}

impl EvalContext<'_> {
    fn eval(&self, expr: &Expr) -> QueryResult<SeriesCollection> {
        match expr {
            Expr::Call { name, args } => self.call(name, args),
            Expr::Str(pattern) | Expr::Ident(pattern) => self.select(pattern),
            Expr::Number(n) => Err(QueryError::NotACall(format!("number {}", n))),
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> QueryResult<SeriesCollection> {
        match name {
            "group" => {
                let mut out = SeriesCollection::new();
                for arg in args {
                    out.merge(self.eval(arg)?);
                }
                Ok(out)
            }
            "alias" => {
                check_arity(name, "2", args.len() == 2, args.len())?;
                let label = string_arg(name, 2, &args[1])?;
                let mut series = self.eval(&args[0])?;
                for (_, handle) in series.iter_mut() {
                    handle.set_alias(label.clone());
                }
                Ok(series)
            }
            "aliasByNode" => {
                check_arity(name, "at least 2", args.len() >= 2, args.len())?;
                let nodes = args[1..]
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| int_arg(name, i + 2, arg))
                    .collect::<QueryResult<Vec<i64>>>()?;
                let mut series = self.eval(&args[0])?;
                for (series_name, handle) in series.iter_mut() {
                    handle.set_alias(select_nodes(series_name, &nodes));
                }
                Ok(series)
            }
            other => Err(QueryError::UnknownFunction(other.to_string())),
        }
    }

    /// Open a cursor for every leaf matching `pattern`
    fn select(&self, pattern: &str) -> QueryResult<SeriesCollection> {
        let mut out = SeriesCollection::new();
        for node in self.fetcher.find(pattern).into_iter().filter(|n| n.leaf) {
            let cursor = self
                .fetcher
                .fetch(&node.name, self.from, self.until, self.max_points)?;
            out.insert(node.name, SeriesHandle::new(cursor));
        }
        Ok(out)
    }
}

fn check_arity(function: &str, expected: &str, ok: bool, got: usize) -> QueryResult<()> {
    if ok {
        Ok(())
    } else {
        Err(QueryError::Arity {
            function: function.to_string(),
            expected: expected.to_string(),
            got,
        })
    }
}

fn string_arg(function: &str, position: usize, arg: &Expr) -> QueryResult<String> {
    match arg {
        Expr::Str(s) => Ok(s.clone()),
        other => Err(QueryError::InvalidArgument {
            function: function.to_string(),
            position,
            message: format!("expected string, found {}", other.kind()),
        }),
    }
}

fn int_arg(function: &str, position: usize, arg: &Expr) -> QueryResult<i64> {
    match arg {
        Expr::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        other => Err(QueryError::InvalidArgument {
            function: function.to_string(),
            position,
            message: format!("expected integer, found {}", other),
        }),
    }
}

/// Join the selected dot segments; negative indices count from the end
fn select_nodes(name: &str, nodes: &[i64]) -> String {
    let parts: Vec<&str> = name.split('.').collect();
    let len = parts.len() as i64;
    nodes
        .iter()
        .filter_map(|&n| {
            let idx = if n < 0 { len + n } else { n };
            usize::try_from(idx).ok().and_then(|i| parts.get(i).copied())
        })
        .collect::<Vec<_>>()
        .join(".")
}
