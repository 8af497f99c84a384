//! Series Query Engine
//!
//! Provides the function-call DSL the Graphite layer translates targets into:
//!
//! - **AST**: Expression tree types
//! - **Parser**: Parse DSL strings into expressions
//! - **Executor**: Evaluate expressions against a `SeriesFetcher`
//! - **Duration**: Extended duration grammar used by relative times
//!
//! # Query Language
//!
//! ```text
//! group("servers.*.cpu.user")
//! group(alias("servers.web1.cpu.user", "web1"))
//! group(aliasByNode("servers.{web1,db1}.mem.used", 1))
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use graphite_bridge::query::{DslEngine, QueryEngine};
//!
//! let series = DslEngine::new().evaluate(
//!     &store,
//!     r#"group("servers.*.cpu.user")"#,
//!     from,
//!     until,
//!     500,
//! )?;
//! ```

mod ast;
pub mod duration;
mod error;
mod executor;
mod parser;

pub use ast::Expr;
pub use duration::{parse_duration, DurationError};
pub use error::{QueryError, QueryResult};
pub use executor::{DslEngine, QueryEngine};
pub use parser::parse_expr;
