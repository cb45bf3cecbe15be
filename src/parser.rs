use crate::ast::{BinaryKind, Node, UnaryKind};
use crate::error::CfgError;
use crate::location::Location;
use crate::token::{token_repr, Token, TokenKind};
use crate::tokenizer::{Tokenizer, Trace};

/// Recursive-descent parser over a [`Tokenizer`], single-token
/// lookahead (`next` holds the pending token, as in the teacher's own
/// hand-written descent parsers).
pub struct Parser {
    tz: Tokenizer,
    next: Token,
    trace: Trace,
}

impl Parser {
    pub fn new(text: &str) -> Result<Self, CfgError> {
        let mut tz = Tokenizer::new(text);
        let next = tz.get_token()?;
        Ok(Self {
            tz,
            next,
            trace: Trace::None,
        })
    }

    pub fn set_trace(&mut self, trace: Trace) {
        self.trace = trace;
    }

    fn advance(&mut self) -> Result<Token, CfgError> {
        let current = self.next.clone();
        self.next = self.tz.get_token()?;
        Ok(current)
    }

    /// The kind of the not-yet-consumed lookahead token. Exposed for
    /// `path::parse_path`, which needs to check the root token is a
    /// `WORD` before reusing [`Parser::atom_trailer`].
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.next.kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CfgError> {
        if self.next.kind == kind {
            self.advance()
        } else {
            Err(CfgError::parser(
                format!("Expected {}, found {}", token_repr(kind), token_repr(self.next.kind)),
                self.next.start,
            ))
        }
    }

    /// Consume the trailing end-of-file. Exposed for `path::parse_path`.
    pub(crate) fn expect_eof(&mut self) -> Result<(), CfgError> {
        self.expect(TokenKind::EOF).map(|_| ())
    }

    fn skip_newlines(&mut self) -> Result<(), CfgError> {
        while self.next.kind == TokenKind::NEWLINE {
            self.advance()?;
        }
        Ok(())
    }

    /// Parse a whole document: an implicit top-level mapping body with
    /// no surrounding `{}`, per spec.md §3's "root must be a mapping"
    /// invariant.
    pub fn parse_document(&mut self) -> Result<Node, CfgError> {
        self.skip_newlines()?;
        let loc = self.next.start;
        let braced = self.next.kind == TokenKind::LCURLY;
        if braced {
            self.advance()?;
        }
        let elements = self.mapping_body(if braced { TokenKind::RCURLY } else { TokenKind::EOF })?;
        if braced {
            self.expect(TokenKind::RCURLY)?;
            self.skip_newlines()?;
        }
        self.expect(TokenKind::EOF)?;
        if self.trace >= Trace::Ast {
            #[cfg(debug_assertions)]
            println!("ast: root mapping with {} entries", elements.len());
        }
        Ok(Node::Mapping { elements, loc })
    }

    /// Parse any single value (used by `@`-included files, which may
    /// have a non-mapping root).
    pub fn parse_value_document(&mut self) -> Result<Node, CfgError> {
        self.skip_newlines()?;
        // A document beginning with `key :` is a mapping; otherwise it's
        // a single expression (list/scalar root for `@`-includes).
        if self.looks_like_mapping_start() {
            return self.parse_document();
        }
        let node = self.expr()?;
        self.skip_newlines()?;
        self.expect(TokenKind::EOF)?;
        Ok(node)
    }

    fn looks_like_mapping_start(&self) -> bool {
        matches!(self.next.kind, TokenKind::WORD | TokenKind::STRING)
    }

    fn mapping_body(&mut self, terminator: TokenKind) -> Result<Vec<(Token, Node)>, CfgError> {
        let mut elements = Vec::new();
        self.skip_newlines()?;
        while self.next.kind != terminator {
            let key = self.key()?;
            self.skip_newlines()?;
            if !matches!(self.next.kind, TokenKind::COLON | TokenKind::ASSIGN) {
                return Err(CfgError::parser(
                    format!(
                        "Expected key-value separator, but found {}",
                        token_repr(self.next.kind)
                    ),
                    self.next.start,
                ));
            }
            self.advance()?;
            self.skip_newlines()?;
            let value = self.expr()?;
            elements.push((key, value));
            self.skip_newlines()?;
            if matches!(self.next.kind, TokenKind::COMMA) {
                self.advance()?;
                self.skip_newlines()?;
            }
        }
        Ok(elements)
    }

    fn key(&mut self) -> Result<Token, CfgError> {
        match self.next.kind {
            TokenKind::WORD | TokenKind::STRING => self.advance(),
            _ => Err(CfgError::parser(
                format!("Unexpected type for key: {}", token_repr(self.next.kind)),
                self.next.start,
            )),
        }
    }

    fn list_body(&mut self) -> Result<Vec<Node>, CfgError> {
        let mut elements = Vec::new();
        self.skip_newlines()?;
        while self.next.kind != TokenKind::RBRACK {
            elements.push(self.expr()?);
            self.skip_newlines()?;
            if self.next.kind == TokenKind::COMMA {
                self.advance()?;
                self.skip_newlines()?;
            }
        }
        Ok(elements)
    }

    // expr := andExpr ('or' andExpr)*
    fn expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.and_expr()?;
        while self.next.kind == TokenKind::OR {
            let loc = node.location();
            self.advance()?;
            let right = self.and_expr()?;
            node = bin(BinaryKind::Or, node, right, loc);
        }
        Ok(node)
    }

    fn and_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.not_expr()?;
        while self.next.kind == TokenKind::AND {
            let loc = node.location();
            self.advance()?;
            let right = self.not_expr()?;
            node = bin(BinaryKind::And, node, right, loc);
        }
        Ok(node)
    }

    fn not_expr(&mut self) -> Result<Node, CfgError> {
        if self.next.kind == TokenKind::NOT {
            let tok = self.advance()?;
            let operand = self.not_expr()?;
            return Ok(Node::Unary {
                kind: UnaryKind::Not,
                operand: Box::new(operand),
                loc: tok.start,
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, CfgError> {
        let left = self.bitor_expr()?;
        let kind = match self.next.kind {
            TokenKind::LT => Some(BinaryKind::Lt),
            TokenKind::GT => Some(BinaryKind::Gt),
            TokenKind::LE => Some(BinaryKind::Le),
            TokenKind::GE => Some(BinaryKind::Ge),
            TokenKind::EQ => Some(BinaryKind::Eq),
            TokenKind::NEQ => Some(BinaryKind::Ne),
            TokenKind::ALT_NEQ => Some(BinaryKind::AltNe),
            TokenKind::IN => Some(BinaryKind::In),
            TokenKind::IS => {
                let loc = left.location();
                self.advance()?;
                if self.next.kind == TokenKind::NOT {
                    self.advance()?;
                    let right = self.bitor_expr()?;
                    return Ok(bin(BinaryKind::IsNot, left, right, loc));
                }
                let right = self.bitor_expr()?;
                return Ok(bin(BinaryKind::Is, left, right, loc));
            }
            TokenKind::NOT => {
                let loc = left.location();
                self.advance()?;
                self.expect(TokenKind::IN)?;
                let right = self.bitor_expr()?;
                return Ok(bin(BinaryKind::NotIn, left, right, loc));
            }
            _ => None,
        };
        if let Some(kind) = kind {
            let loc = left.location();
            self.advance()?;
            let right = self.bitor_expr()?;
            return Ok(bin(kind, left, right, loc));
        }
        Ok(left)
    }

    fn bitor_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.bitxor_expr()?;
        while self.next.kind == TokenKind::BITOR {
            let loc = node.location();
            self.advance()?;
            let right = self.bitxor_expr()?;
            node = bin(BinaryKind::BitOr, node, right, loc);
        }
        Ok(node)
    }

    fn bitxor_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.bitand_expr()?;
        while self.next.kind == TokenKind::BITXOR {
            let loc = node.location();
            self.advance()?;
            let right = self.bitand_expr()?;
            node = bin(BinaryKind::BitXor, node, right, loc);
        }
        Ok(node)
    }

    fn bitand_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.shift_expr()?;
        while self.next.kind == TokenKind::BITAND {
            let loc = node.location();
            self.advance()?;
            let right = self.shift_expr()?;
            node = bin(BinaryKind::BitAnd, node, right, loc);
        }
        Ok(node)
    }

    fn shift_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.add_expr()?;
        loop {
            let kind = match self.next.kind {
                TokenKind::LSHIFT => BinaryKind::LShift,
                TokenKind::RSHIFT => BinaryKind::RShift,
                _ => break,
            };
            let loc = node.location();
            self.advance()?;
            let right = self.add_expr()?;
            node = bin(kind, node, right, loc);
        }
        Ok(node)
    }

    fn add_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.mul_expr()?;
        loop {
            let kind = match self.next.kind {
                TokenKind::PLUS => BinaryKind::Add,
                TokenKind::MINUS => BinaryKind::Sub,
                _ => break,
            };
            let loc = node.location();
            self.advance()?;
            let right = self.mul_expr()?;
            node = bin(kind, node, right, loc);
        }
        Ok(node)
    }

    fn mul_expr(&mut self) -> Result<Node, CfgError> {
        let mut node = self.unary_expr()?;
        loop {
            let kind = match self.next.kind {
                TokenKind::STAR => BinaryKind::Mul,
                TokenKind::SLASH => BinaryKind::Div,
                TokenKind::SLASHSLASH => BinaryKind::FloorDiv,
                TokenKind::MODULO => BinaryKind::Mod,
                _ => break,
            };
            let loc = node.location();
            self.advance()?;
            let right = self.unary_expr()?;
            node = bin(kind, node, right, loc);
        }
        Ok(node)
    }

    fn unary_expr(&mut self) -> Result<Node, CfgError> {
        let kind = match self.next.kind {
            TokenKind::PLUS => Some(UnaryKind::Plus),
            TokenKind::MINUS => Some(UnaryKind::Minus),
            TokenKind::TILDE => Some(UnaryKind::Tilde),
            TokenKind::AT => Some(UnaryKind::At),
            _ => None,
        };
        if let Some(kind) = kind {
            let tok = self.advance()?;
            let operand = self.unary_expr()?;
            return Ok(Node::Unary {
                kind,
                operand: Box::new(operand),
                loc: tok.start,
            });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Node, CfgError> {
        let base = self.atom_trailer()?;
        if self.next.kind == TokenKind::POWER {
            let loc = base.location();
            self.advance()?;
            let exponent = self.unary_expr()?;
            return Ok(bin(BinaryKind::Pow, base, exponent, loc));
        }
        Ok(base)
    }

    /// `primary := atom trailer*`. Exposed for `path::parse_path`, which
    /// reuses this production directly rather than hand-rolling a
    /// second one, since a path string is exactly a primary rooted at a
    /// bare `WORD`.
    pub(crate) fn atom_trailer(&mut self) -> Result<Node, CfgError> {
        let mut node = self.atom()?;
        loop {
            match self.next.kind {
                TokenKind::DOT => {
                    let loc = node.location();
                    self.advance()?;
                    let name = self.expect(TokenKind::WORD)?;
                    node = bin(BinaryKind::Dot, node, Node::Token(name), loc);
                }
                TokenKind::LBRACK => {
                    let loc = node.location();
                    self.advance()?;
                    node = self.subscript(node, loc)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn subscript(&mut self, base: Node, loc: Location) -> Result<Node, CfgError> {
        let first = if self.next.kind == TokenKind::COLON {
            None
        } else {
            Some(Box::new(self.expr()?))
        };
        if self.next.kind == TokenKind::COLON {
            self.advance()?;
            let stop = if matches!(self.next.kind, TokenKind::COLON | TokenKind::RBRACK) {
                None
            } else {
                Some(Box::new(self.expr()?))
            };
            let step = if self.next.kind == TokenKind::COLON {
                self.advance()?;
                if self.next.kind == TokenKind::RBRACK {
                    None
                } else {
                    Some(Box::new(self.expr()?))
                }
            } else {
                None
            };
            self.expect(TokenKind::RBRACK)?;
            let slice = Node::Slice {
                start: first,
                stop,
                step,
                loc,
            };
            return Ok(bin(BinaryKind::Colon, base, slice, loc));
        }
        self.expect(TokenKind::RBRACK)?;
        let index = first.ok_or_else(|| {
            CfgError::parser("expected 1 expression, found 0", self.next.start)
        })?;
        Ok(bin(BinaryKind::Index, base, *index, loc))
    }

    fn atom(&mut self) -> Result<Node, CfgError> {
        match self.next.kind {
            TokenKind::INTEGER
            | TokenKind::FLOAT
            | TokenKind::COMPLEX
            | TokenKind::TRUE
            | TokenKind::FALSE
            | TokenKind::NONE
            | TokenKind::WORD
            | TokenKind::BACKTICK => {
                let tok = self.advance()?;
                Ok(Node::Token(tok))
            }
            TokenKind::STRING => {
                let mut tok = self.advance()?;
                // Adjacent string literals concatenate.
                while self.next.kind == TokenKind::STRING {
                    let next = self.advance()?;
                    let combined_text = format!("{}{}", tok.text, next.text);
                    let combined_value = match (tok.value, next.value) {
                        (crate::token::Value::String(a), crate::token::Value::String(b)) => {
                            crate::token::Value::String(a + &b)
                        }
                        _ => unreachable!("string tokens always carry Value::String"),
                    };
                    tok = Token::new(TokenKind::STRING, combined_text, combined_value, tok.start, next.end);
                }
                Ok(Node::Token(tok))
            }
            TokenKind::LPAREN => {
                self.advance()?;
                self.skip_newlines()?;
                let inner = self.expr()?;
                self.skip_newlines()?;
                self.expect(TokenKind::RPAREN)?;
                Ok(inner)
            }
            TokenKind::LBRACK => {
                let loc = self.next.start;
                self.advance()?;
                let elements = self.list_body()?;
                self.expect(TokenKind::RBRACK)?;
                Ok(Node::List { elements, loc })
            }
            TokenKind::LCURLY => {
                let loc = self.next.start;
                self.advance()?;
                let elements = self.mapping_body(TokenKind::RCURLY)?;
                self.expect(TokenKind::RCURLY)?;
                Ok(Node::Mapping { elements, loc })
            }
            TokenKind::DOLLAR => {
                let tok = self.advance()?;
                self.expect(TokenKind::LCURLY)?;
                let path = self.atom_trailer()?;
                self.expect(TokenKind::RCURLY)?;
                Ok(Node::Unary {
                    kind: UnaryKind::Dollar,
                    operand: Box::new(path),
                    loc: tok.start,
                })
            }
            _ => Err(CfgError::parser(
                format!("Unexpected token: {}", token_repr(self.next.kind)),
                self.next.start,
            )),
        }
    }
}

fn bin(kind: BinaryKind, left: Node, right: Node, loc: Location) -> Node {
    Node::Binary {
        kind,
        left: Box::new(left),
        right: Box::new(right),
        loc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn parse(src: &str) -> Node {
        let mut p = Parser::new(src).unwrap();
        p.parse_document().unwrap()
    }

    #[test]
    fn parses_flat_mapping() {
        let node = parse("a: 1\nb: 2\n");
        match node {
            Node::Mapping { elements, .. } => assert_eq!(elements.len(), 2),
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn parses_nested_list_and_mapping() {
        let node = parse("a: [1, 2, {x: 3}]\n");
        match node {
            Node::Mapping { elements, .. } => {
                assert_eq!(elements.len(), 1);
                match &elements[0].1 {
                    Node::List { elements, .. } => assert_eq!(elements.len(), 3),
                    _ => panic!("expected list"),
                }
            }
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn trailing_comma_is_allowed() {
        let node = parse("a: 1,\nb: 2,\n");
        match node {
            Node::Mapping { elements, .. } => assert_eq!(elements.len(), 2),
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn parses_reference_and_include() {
        let node = parse("a: ${b.c}\nd: @ \"other.cfg\"\n");
        match node {
            Node::Mapping { elements, .. } => assert_eq!(elements.len(), 2),
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn adjacent_strings_concatenate() {
        let node = parse("a: 'x' 'y'\n");
        match node {
            Node::Mapping { elements, .. } => match &elements[0].1 {
                Node::Token(t) => assert_eq!(t.value, crate::token::Value::String("xy".to_string())),
                _ => panic!("expected token"),
            },
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn is_not_and_not_in_parse() {
        let node = parse("a: x is not null\nb: y not in z\n");
        match node {
            Node::Mapping { elements, .. } => {
                assert!(matches!(
                    elements[0].1,
                    Node::Binary {
                        kind: BinaryKind::IsNot,
                        ..
                    }
                ));
                assert!(matches!(
                    elements[1].1,
                    Node::Binary {
                        kind: BinaryKind::NotIn,
                        ..
                    }
                ));
            }
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn missing_separator_is_reported() {
        let err = Parser::new("a 1\n").unwrap().parse_document().unwrap_err();
        assert!(format!("{}", err).contains("Expected key-value separator"));
    }

    #[test]
    fn root_mapping_may_be_wrapped_in_braces() {
        let node = parse("{ a: 1, b: 2 }\n");
        match node {
            Node::Mapping { elements, .. } => assert_eq!(elements.len(), 2),
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn at_applies_to_the_whole_power_expression() {
        // `@` is a unaryExpr-level prefix, so `@ b ** 2` parses as
        // `@ (b ** 2)`, not `(@ b) ** 2`.
        let node = parse("a: @ b ** 2\n");
        match node {
            Node::Mapping { elements, .. } => match &elements[0].1 {
                Node::Unary { kind: UnaryKind::At, operand, .. } => {
                    assert!(matches!(**operand, Node::Binary { kind: BinaryKind::Pow, .. }));
                }
                other => panic!("expected `@` wrapping a power expression, got {:?}", other),
            },
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn non_word_key_is_reported() {
        let err = Parser::new("1: 2\n").unwrap().parse_document().unwrap_err();
        assert!(format!("{}", err).contains("Unexpected type for key"));
    }
}
