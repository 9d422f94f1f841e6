//! bugsmith syntax layer
//!
//! Python source text in, typed syntax tree out, and back again.
//!
//! # Architecture
//!
//! ```text
//! source text → PythonParser (tree-sitter) → Module → PythonRenderer → source text
//! ```
//!
//! The tree is a closed set of tagged variants ([`Stmt`], [`Expr`]). Parsing
//! and rendering sit behind the [`SourceParser`] and [`SourceRenderer`]
//! traits so the mutation engine can be driven by other implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use bugsmith_syntax::{PythonParser, PythonRenderer, SourceParser, SourceRenderer};
//!
//! let module = PythonParser::new().parse("x = 1\n")?;
//! assert_eq!(PythonRenderer::new().render(&module), "x = 1\n");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod ast;
pub mod error;
pub mod parser;
pub mod render;

// Re-exports for convenience
pub use ast::{
    Alias, Arg, BinOp, BoolOp, ClassDef, CmpOp, CompKind, Comprehension, DictItem, ExceptHandler,
    Expr, For, FunctionDef, IntLiteral, MatchCase, Module, Param, Segment, Stmt, Try, UnaryOp,
    With, WithItem,
};
pub use error::{ParseError, Position};
pub use parser::{PythonParser, SourceParser, DEFAULT_MAX_DEPTH};
pub use render::{PythonRenderer, SourceRenderer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
