use crate::location::Location;
use std::fmt::{Display, Formatter};

/// A complex number with `f64` components, produced by numeric literals
/// with a trailing `j`/`J` suffix and by arithmetic that promotes to
/// complex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn imaginary(im: f64) -> Self {
        Self { re: 0.0, im }
    }
}

impl Display for Complex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.re == 0.0 {
            write!(f, "{}j", self.im)
        } else {
            write!(f, "({}{:+}j)", self.re, self.im)
        }
    }
}

/// The decoded value carried by a scalar token, and the fully-evaluated
/// runtime value produced by the evaluator.
///
/// A single type serves both roles: tokens only ever populate the
/// scalar variants (`Null` through `String`); `List` and `Mapping` are
/// populated by `Config::get`/`as_dict` once path-walking and expression
/// evaluation are complete.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value at all: used for punctuation/operator tokens.
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Complex(Complex),
    String(String),
    DateTime(ConfigDateTime),
    List(Vec<Value>),
    Mapping(crate::value::OrderedMap),
}

/// A date-time produced by the ISO date-time special-value pattern.
/// Naive (no offset given) or fixed-offset (`+HH:MM` given) per
/// spec.md §4.7 rule 1.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDateTime {
    Naive(chrono::NaiveDateTime),
    Fixed(chrono::DateTime<chrono::FixedOffset>),
}

impl Display for ConfigDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigDateTime::Naive(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            ConfigDateTime::Fixed(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Complex(c) => c.re != 0.0 || c.im != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::DateTime(_) => true,
            Value::List(l) => !l.is_empty(),
            Value::Mapping(m) => !m.is_empty(),
        }
    }

    /// Render the value the way the interpolation special value (§4.7
    /// rule 4) does: lists as `[x, y, ...]`, mappings as `{k: v, ...}`,
    /// scalars via their native textual form.
    pub fn string_for(&self) -> String {
        match self {
            Value::Undefined => String::new(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Complex(c) => c.to_string(),
            Value::String(s) => s.clone(),
            Value::DateTime(d) => d.to_string(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::string_for).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Mapping(m) => {
                let inner: Vec<String> = m
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.string_for()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Mapping(_) => "mapping",
        }
    }
}

/// The lexical category of a token. Names follow spec.md §6 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EOF,
    WORD,
    INTEGER,
    FLOAT,
    COMPLEX,
    STRING,
    NEWLINE,
    LCURLY,
    RCURLY,
    LBRACK,
    RBRACK,
    LPAREN,
    RPAREN,
    LT,
    GT,
    LE,
    GE,
    EQ,
    ASSIGN,
    NEQ,
    ALT_NEQ,
    LSHIFT,
    RSHIFT,
    DOT,
    COMMA,
    COLON,
    AT,
    PLUS,
    MINUS,
    STAR,
    POWER,
    SLASH,
    TILDE,
    SLASHSLASH,
    MODULO,
    BACKTICK,
    DOLLAR,
    TRUE,
    FALSE,
    NONE,
    IS,
    IN,
    NOT,
    AND,
    OR,
    BITAND,
    BITOR,
    BITXOR,
    ISNOT,
    NOTIN,
}

/// Human-readable descriptor used in diagnostics, e.g. `expected
/// identifier, found whole number`. Mirrors spec.md §6's `token_repr`.
pub fn token_repr(kind: TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        EOF => "end-of-file",
        WORD => "identifier",
        INTEGER => "whole number",
        FLOAT => "floating-point number",
        COMPLEX => "complex number",
        STRING => "string",
        NEWLINE => "end-of-line",
        LCURLY => "'{'",
        RCURLY => "'}'",
        LBRACK => "'['",
        RBRACK => "']'",
        LPAREN => "'('",
        RPAREN => "')'",
        LT => "'<'",
        GT => "'>'",
        LE => "'<='",
        GE => "'>='",
        EQ => "'=='",
        ASSIGN => "'='",
        NEQ => "'!='",
        ALT_NEQ => "'<>'",
        LSHIFT => "'<<'",
        RSHIFT => "'>>'",
        DOT => "'.'",
        COMMA => "','",
        COLON => "':'",
        AT => "'@'",
        PLUS => "'+'",
        MINUS => "'-'",
        STAR => "'*'",
        POWER => "'**'",
        SLASH => "'/'",
        TILDE => "'~'",
        SLASHSLASH => "'//'",
        MODULO => "'%'",
        BACKTICK => "'`'",
        DOLLAR => "'$'",
        TRUE => "'true'",
        FALSE => "'false'",
        NONE => "'null'",
        IS => "'is'",
        IN => "'in'",
        NOT => "'not'",
        AND => "'and'",
        OR => "'or'",
        BITAND => "'&'",
        BITOR => "'|'",
        BITXOR => "'^'",
        ISNOT => "'is not'",
        NOTIN => "'not in'",
    }
}

/// A located token: its kind, verbatim text, decoded value, and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: Value,
    pub start: Location,
    pub end: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, value: Value, start: Location, end: Location) -> Self {
        Self {
            kind,
            text,
            value,
            start,
            end,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({:?}) @ {}", self.kind, self.text, self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_python_like_semantics() {
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
    }

    #[test]
    fn string_for_renders_lists_and_scalars() {
        let v = Value::List(vec![Value::Integer(1), Value::String("a".into())]);
        assert_eq!(v.string_for(), "[1, a]");
    }

    #[test]
    fn token_repr_covers_keywords_and_punctuation() {
        assert_eq!(token_repr(TokenKind::WORD), "identifier");
        assert_eq!(token_repr(TokenKind::INTEGER), "whole number");
        assert_eq!(token_repr(TokenKind::ISNOT), "'is not'");
    }
}
