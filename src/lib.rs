//! CFG is a textual configuration format — a strict superset of JSON —
//! supporting comments, trailing commas, unquoted identifier keys,
//! path-based access (`a.b[2].c`), cross-references within a document
//! (`${path}`), backtick-delimited special values (environment
//! variables, ISO timestamps, host-object lookups, interpolated
//! strings), arithmetic and logical expressions, include/merge
//! composition (`@ "path"`), and lazy evaluation with on-demand
//! resolution.
//!
//! # Example
//!
//! ```
//! use cfg_rs::{Config, Options, OrderedMap, Value};
//!
//! let mut context = OrderedMap::new();
//! context.insert("retries", Value::Integer(3));
//!
//! let cfg = Config::new(
//!     r#"
//!     name: "demo"
//!     timeout: retries * 10
//!     "#,
//!     Options { context, ..Options::default() },
//! )
//! .unwrap();
//!
//! assert_eq!(cfg.get("name", None).unwrap().string_for(), "demo");
//! assert_eq!(cfg.get("timeout", None).unwrap(), Value::Integer(30));
//! ```
//!
//! # Design
//!
//! The core is three tightly coupled subsystems, in leaves-first
//! dependency order: the [`Tokenizer`](tokenizer::Tokenizer) turns raw
//! text into a stream of located tokens; the [`Parser`](parser::Parser)
//! consumes tokens into a typed [`ast::Node`] tree via a
//! precedence-climbing recursive descent; the [`Config`] evaluator
//! lazily resolves values against that tree, walking paths, evaluating
//! expressions, merging/subtracting containers, dereferencing
//! environment/host/interpolated specials, and detecting circular
//! references.
//!
//! # License
//! Provided under the MIT license.

mod ast;
mod config;
mod error;
mod evaluator;
mod include;
mod location;
mod parser;
mod path;
mod source;
mod special;
mod token;
mod tokenizer;
mod value;

pub use ast::{BinaryKind, Node, UnaryKind};
pub use config::{Config, Options};
pub use error::CfgError;
pub use location::Location;
pub use token::{Complex, ConfigDateTime, Token, TokenKind, Value};
pub use tokenizer::Trace;
pub use value::{ListValue, MappingValue, OrderedMap, Position};

/// Which grammar entry point [`parse`] should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// A full document: an implicit top-level mapping body, root must
    /// be a mapping.
    Document,
    /// A single value, as parsed for an `@`-included file (mapping,
    /// list, or scalar root).
    Value,
}

/// Parse `text` starting from `rule`, without building a [`Config`].
/// Exposed for tooling that wants the raw AST — `Config::new`/`load_file`
/// are the entry points for ordinary use.
pub fn parse(text: &str, rule: Rule) -> Result<Node, CfgError> {
    let mut p = parser::Parser::new(text)?;
    match rule {
        Rule::Document => p.parse_document(),
        Rule::Value => p.parse_value_document(),
    }
}

/// Parse a path string such as `"a.b[2].c"` into the same AST shape a
/// `${...}` reference operand would produce.
pub fn parse_path(s: &str) -> Result<Node, CfgError> {
    path::parse_path(s)
}

/// `true` if `s` is a valid bare identifier (`XID_Start (XID_Continue)*`,
/// `_` permitted as a start/continue character).
pub fn is_identifier(s: &str) -> bool {
    path::is_identifier(s)
}

/// Reconstruct the canonical path text for a path/reference AST node.
pub fn to_source(node: &Node) -> String {
    path::to_source(node)
}

/// Human-readable descriptor for a [`TokenKind`], e.g. `identifier`,
/// `whole number`, or the literal punctuation in single quotes.
pub fn token_repr(kind: TokenKind) -> &'static str {
    token::token_repr(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_rule_yields_mapping_root() {
        let node = parse("a: 1\n", Rule::Document).unwrap();
        assert!(matches!(node, Node::Mapping { .. }));
    }

    #[test]
    fn parse_value_rule_accepts_bare_list_root() {
        let node = parse("[1, 2, 3]", Rule::Value).unwrap();
        assert!(matches!(node, Node::List { .. }));
    }

    #[test]
    fn free_functions_delegate_to_path_and_token_modules() {
        assert!(is_identifier("foo"));
        assert_eq!(token_repr(TokenKind::WORD), "identifier");
        let node = parse_path("a.b").unwrap();
        assert_eq!(to_source(&node), "a.b");
    }
}
