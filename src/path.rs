use crate::ast::{BinaryKind, Node};
use crate::error::CfgError;
use crate::parser::Parser;
use crate::token::TokenKind;

/// Parse a path string such as `"a.b[2].c"` or `"a[1:-1]"` into the same
/// `Node` shape the main grammar produces for a `${...}` operand, so
/// `Config::get` and reference evaluation can share one walker.
///
/// Reuses the main grammar's `primary := atom trailer*` production
/// (`Parser::atom_trailer`) rather than hand-rolling a second mini
/// parser: a path string is exactly that production rooted at a bare
/// `WORD`.
pub fn parse_path(s: &str) -> Result<Node, CfgError> {
    let mut parser = Parser::new(s).map_err(|e| CfgError::invalid_path(s, Some(e)))?;
    if parser.peek_kind() != TokenKind::WORD {
        return Err(CfgError::invalid_path(s, None));
    }
    let node = parser
        .atom_trailer()
        .map_err(|e| CfgError::invalid_path(s, Some(e)))?;
    parser
        .expect_eof()
        .map_err(|e| CfgError::invalid_path(s, Some(e)))?;
    Ok(node)
}

/// Reconstruct the canonical path text for a `Dot`/`Index`/`Colon` chain
/// (or a bare root token), used for circular-reference keys and error
/// messages. The inverse of [`parse_path`].
pub fn to_source(node: &Node) -> String {
    match node {
        Node::Token(t) => t.text.clone(),
        Node::Binary {
            kind: BinaryKind::Dot,
            left,
            right,
            ..
        } => format!("{}.{}", to_source(left), to_source(right)),
        Node::Binary {
            kind: BinaryKind::Index,
            left,
            right,
            ..
        } => format!("{}[{}]", to_source(left), index_source(right)),
        Node::Binary {
            kind: BinaryKind::Colon,
            left,
            right,
            ..
        } => format!("{}[{}]", to_source(left), to_source(right)),
        Node::Slice {
            start, stop, step, ..
        } => {
            let part = |n: &Option<Box<Node>>| n.as_deref().map(index_source).unwrap_or_default();
            match step {
                Some(_) => format!("{}:{}:{}", part(start), part(stop), part(step)),
                None => format!("{}:{}", part(start), part(stop)),
            }
        }
        other => format!("{:?}", other),
    }
}

fn index_source(node: &Node) -> String {
    match node {
        Node::Token(t) if t.kind == TokenKind::STRING => format!("{:?}", t.value.string_for()),
        Node::Token(t) => t.text.clone(),
        other => to_source(other),
    }
}

/// The flattened sequence of steps from the root token out to the tip of
/// a path chain, root first. Mostly useful for diagnostics: the
/// evaluator itself walks the chain recursively rather than iterating
/// this list.
pub fn path_iterator(node: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    flatten(node, &mut out);
    out
}

fn flatten(node: &Node, out: &mut Vec<Node>) {
    match node {
        Node::Binary {
            kind: BinaryKind::Dot | BinaryKind::Index | BinaryKind::Colon,
            left,
            ..
        } => {
            flatten(left, out);
            out.push(node.clone());
        }
        other => out.push(other.clone()),
    }
}

/// `true` if `s` is a valid bare identifier: `XID_Start (XID_Continue)*`
/// with `_` permitted as a start/continue character, per spec.md §6.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || unicode_ident::is_xid_start(c) => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || unicode_ident::is_xid_continue(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_and_indexed_path() {
        let node = parse_path("a.b[2].c").unwrap();
        assert_eq!(to_source(&node), "a.b[2].c");
    }

    #[test]
    fn parses_negative_index() {
        let node = parse_path("a[-1]").unwrap();
        assert_eq!(to_source(&node), "a[-1]");
    }

    #[test]
    fn parses_slice() {
        let node = parse_path("a[1:-1]").unwrap();
        assert_eq!(to_source(&node), "a[1:-1]");
    }

    #[test]
    fn rejects_malformed_path() {
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("").is_err());
    }

    #[test]
    fn identifier_check_matches_tokenizer_rules() {
        assert!(is_identifier("foo_bar"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn path_iterator_yields_root_first() {
        let node = parse_path("a.b").unwrap();
        let steps = path_iterator(&node);
        assert_eq!(steps.len(), 2);
        assert_eq!(to_source(&steps[0]), "a");
    }
}
