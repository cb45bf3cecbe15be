use crate::error::CfgError;
use crate::location::Location;
use crate::source::CharSource;
use crate::token::{Complex, Token, TokenKind, Value};

/// Debug-only tracing levels, generalizing the teacher's `Log<T>`
/// (`util/logger.rs`) ordered-verbosity idiom: under
/// `cfg(debug_assertions)`, a `Trace` level above `None` prints
/// increasingly detailed steps — tokens as they're produced, AST nodes
/// as they're built, and evaluator path steps/cache hits. Release
/// builds compile the prints out. Shared by `Tokenizer`, `Parser`, and
/// `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trace {
    None,
    Tokens,
    Ast,
    Eval,
}

/// Lexical analyzer: turns a `CharSource` into a stream of located
/// [`Token`]s, per spec.md §4.2.
///
/// After the end of input, `get_token` keeps returning `EOF` tokens
/// indefinitely so callers (in particular the one-token-lookahead
/// parser) never have to special-case exhaustion.
pub struct Tokenizer {
    source: CharSource,
    trace: Trace,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("true", TokenKind::TRUE),
    ("false", TokenKind::FALSE),
    ("null", TokenKind::NONE),
    ("is", TokenKind::IS),
    ("in", TokenKind::IN),
    ("not", TokenKind::NOT),
    ("and", TokenKind::AND),
    ("or", TokenKind::OR),
];

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Self {
            source: CharSource::new(text),
            trace: Trace::None,
        }
    }

    pub fn set_trace(&mut self, trace: Trace) {
        self.trace = trace;
    }

    /// Produce the next token. Returns `EOF` forever once the stream is
    /// exhausted.
    pub fn get_token(&mut self) -> Result<Token, CfgError> {
        let token = self.scan_token()?;
        if self.trace >= Trace::Tokens {
            #[cfg(debug_assertions)]
            println!("token: {:?} {:?} @ {}", token.kind, token.text, token.start);
        }
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token, CfgError> {
        loop {
            let start = self.source.logical_location();
            let c = match self.source.read() {
                None => return Ok(self.make(TokenKind::EOF, String::new(), Value::Undefined, start)),
                Some(c) => c,
            };

            if c == '\n' {
                return Ok(self.make(TokenKind::NEWLINE, "\n".to_string(), Value::Undefined, start));
            }
            if c == '\r' {
                let mut text = String::from("\r");
                if let Some(n) = self.source.read() {
                    if n == '\n' {
                        text.push('\n');
                    } else {
                        self.source.push_back(n);
                    }
                }
                return Ok(self.make(TokenKind::NEWLINE, text, Value::Undefined, start));
            }
            if c.is_whitespace() {
                continue;
            }
            if c == '\\' {
                match self.source.read() {
                    Some('\n') => continue,
                    Some(other) => {
                        self.source.push_back(other);
                        return Err(CfgError::tokenizer("Unexpected character: \\", start));
                    }
                    None => return Err(CfgError::tokenizer("Unexpected character: \\", start)),
                }
            }
            if c == '#' {
                let mut text = String::from("#");
                loop {
                    match self.source.read() {
                        None => break,
                        Some(n) if n == '\n' || n == '\r' => {
                            self.source.push_back(n);
                            break;
                        }
                        Some(other) => text.push(other),
                    }
                }
                return Ok(self.make(TokenKind::NEWLINE, text, Value::Undefined, start));
            }

            if is_ident_start(c) {
                return self.scan_identifier(c, start);
            }

            if c == '\'' || c == '"' {
                return self.scan_string(c, start);
            }
            if c == '`' {
                return self.scan_backtick(start);
            }

            if c.is_ascii_digit() {
                self.source.push_back(c);
                return self.scan_number(start);
            }
            if c == '.' {
                if let Some(n) = self.source.read() {
                    let is_num_start = n.is_ascii_digit();
                    self.source.push_back(n);
                    if is_num_start {
                        self.source.push_back(c);
                        return self.scan_number(start);
                    }
                }
                return Ok(self.make(TokenKind::DOT, ".".to_string(), Value::Undefined, start));
            }
            if c == '-' {
                if let Some(n) = self.source.read() {
                    let is_num_start = n.is_ascii_digit() || n == '.';
                    self.source.push_back(n);
                    if is_num_start {
                        self.source.push_back(c);
                        return self.scan_number(start);
                    }
                }
                return Ok(self.make(TokenKind::MINUS, "-".to_string(), Value::Undefined, start));
            }

            return self.scan_punctuation(c, start);
        }
    }

    /// Look at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        let c = self.source.read()?;
        self.source.push_back(c);
        Some(c)
    }

    fn make(&self, kind: TokenKind, text: String, value: Value, start: Location) -> Token {
        Token::new(kind, text, value, start, self.source.char_location())
    }

    fn scan_identifier(&mut self, first: char, start: Location) -> Result<Token, CfgError> {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.source.read() {
            if is_ident_continue(c) {
                text.push(c);
            } else {
                self.source.push_back(c);
                break;
            }
        }
        if let Some((_, kind)) = KEYWORDS.iter().find(|(kw, _)| *kw == text) {
            let value = match kind {
                TokenKind::TRUE => Value::Bool(true),
                TokenKind::FALSE => Value::Bool(false),
                TokenKind::NONE => Value::Null,
                _ => Value::Undefined,
            };
            return Ok(self.make(*kind, text, value, start));
        }
        Ok(self.make(TokenKind::WORD, text.clone(), Value::String(text), start))
    }

    fn scan_string(&mut self, quote: char, start: Location) -> Result<Token, CfgError> {
        // Detect a triple-quoted string: the opening quote immediately
        // followed by two more of the same quote character.
        let mut triple = false;
        if let Some(n1) = self.source.read() {
            if n1 == quote {
                if let Some(n2) = self.source.read() {
                    if n2 == quote {
                        triple = true;
                    } else {
                        self.source.push_back(n2);
                        self.source.push_back(n1);
                    }
                } else {
                    self.source.push_back(n1);
                }
            } else {
                self.source.push_back(n1);
            }
        }

        let mut decoded = String::new();
        let mut raw = String::new();
        raw.push(quote);
        if triple {
            raw.push(quote);
            raw.push(quote);
        }

        loop {
            let c = match self.source.read() {
                None => {
                    return Err(CfgError::tokenizer("Unterminated quoted string", start));
                }
                Some(c) => c,
            };
            if c == quote {
                if !triple {
                    raw.push(c);
                    break;
                }
                // Look for two more quote chars to close the triple string.
                if let Some(n1) = self.source.read() {
                    if n1 == quote {
                        if let Some(n2) = self.source.read() {
                            if n2 == quote {
                                raw.push(quote);
                                raw.push(quote);
                                raw.push(quote);
                                break;
                            }
                            self.source.push_back(n2);
                        }
                        self.source.push_back(n1);
                    } else {
                        self.source.push_back(n1);
                    }
                }
                decoded.push(c);
                raw.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(CfgError::tokenizer("Unterminated quoted string", start));
            }
            if c == '\\' {
                raw.push(c);
                self.scan_escape(&mut decoded, &mut raw, start)?;
                continue;
            }
            decoded.push(c);
            raw.push(c);
        }

        Ok(self.make(TokenKind::STRING, raw, Value::String(decoded), start))
    }

    fn scan_backtick(&mut self, start: Location) -> Result<Token, CfgError> {
        let mut decoded = String::new();
        let mut raw = String::from("`");
        loop {
            let c = match self.source.read() {
                None => return Err(CfgError::tokenizer("Unterminated `-string", start)),
                Some(c) => c,
            };
            if c == '`' {
                raw.push(c);
                break;
            }
            if c == '\\' {
                raw.push(c);
                self.scan_escape(&mut decoded, &mut raw, start)?;
                continue;
            }
            decoded.push(c);
            raw.push(c);
        }
        Ok(self.make(TokenKind::BACKTICK, raw, Value::String(decoded), start))
    }

    /// Decode one backslash escape (the backslash itself has already
    /// been consumed and pushed onto `raw`).
    fn scan_escape(&mut self, decoded: &mut String, raw: &mut String, start: Location) -> Result<(), CfgError> {
        let c = match self.source.read() {
            None => return Err(CfgError::tokenizer("Invalid escape sequence", start)),
            Some(c) => c,
        };
        raw.push(c);
        match c {
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0C}'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'v' => decoded.push('\u{0B}'),
            '\\' => decoded.push('\\'),
            '\'' => decoded.push('\''),
            '"' => decoded.push('"'),
            '\n' => {
                // Escaped line continuation inside a string: drop it.
            }
            'x' => self.scan_hex_escape(decoded, raw, 2, start)?,
            'u' => self.scan_hex_escape(decoded, raw, 4, start)?,
            'U' => self.scan_hex_escape(decoded, raw, 8, start)?,
            _ => return Err(CfgError::tokenizer("Invalid escape sequence", start)),
        }
        Ok(())
    }

    fn scan_hex_escape(
        &mut self,
        decoded: &mut String,
        raw: &mut String,
        digits: usize,
        start: Location,
    ) -> Result<(), CfgError> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.source.read() {
                Some(c) if c.is_ascii_hexdigit() => {
                    raw.push(c);
                    hex.push(c);
                }
                _ => return Err(CfgError::tokenizer("Invalid escape sequence", start)),
            }
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| CfgError::tokenizer("Invalid escape sequence", start))?;
        if (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF {
            return Err(CfgError::tokenizer("Invalid escape sequence", start));
        }
        let ch = char::from_u32(code)
            .ok_or_else(|| CfgError::tokenizer("Invalid escape sequence", start))?;
        decoded.push(ch);
        Ok(())
    }

    /// Read one run of base-appropriate digits (with `_` separators),
    /// enforcing "not at start, not at end, not adjacent".
    fn read_digit_run(
        &mut self,
        text: &mut String,
        is_digit: impl Fn(char) -> bool,
        start: Location,
    ) -> Result<bool, CfgError> {
        let mut read_any = false;
        let mut last_was_underscore = false;
        let mut last_was_digit = false;
        loop {
            match self.source.read() {
                Some(c) if is_digit(c) => {
                    text.push(c);
                    read_any = true;
                    last_was_underscore = false;
                    last_was_digit = true;
                }
                Some('_') => {
                    if !last_was_digit {
                        return Err(CfgError::tokenizer(
                            format!("Invalid '_' in number: {}", text),
                            start,
                        ));
                    }
                    text.push('_');
                    last_was_underscore = true;
                    last_was_digit = false;
                }
                Some(c) => {
                    self.source.push_back(c);
                    break;
                }
                None => break,
            }
        }
        if last_was_underscore {
            return Err(CfgError::tokenizer(
                format!("Invalid '_' at end of number: {}", text),
                start,
            ));
        }
        Ok(read_any)
    }

    /// Lex a numeric literal. Called only once the caller has confirmed
    /// (via `peek_char`, without consuming) that the upcoming characters
    /// form a number: an optional `-` immediately followed by a digit or
    /// `.`, then the digit/`.`/`e`/`j` grammar from spec.md §4.2.
    fn scan_number(&mut self, start: Location) -> Result<Token, CfgError> {
        let sign = self.peek_char() == Some('-');
        if sign {
            self.source.read();
        }

        // Radix-prefixed integer literals: 0x / 0o / 0b.
        if self.peek_char() == Some('0') {
            self.source.read();
            let prefix = self.peek_char();
            let radix_digits = match prefix {
                Some('x') | Some('X') => Some((16, "Invalid character in number")),
                Some('o') | Some('O') => Some((8, "Invalid character in number")),
                Some('b') | Some('B') => Some((2, "Invalid character in number")),
                _ => None,
            };
            if let Some((radix, err_msg)) = radix_digits {
                let marker = self.source.read().unwrap();
                let mut digits = String::new();
                self.read_digit_run(
                    &mut digits,
                    |c| c.to_digit(radix).is_some(),
                    start,
                )?;
                if digits.is_empty() {
                    return Err(CfgError::tokenizer(err_msg, start));
                }
                let magnitude = i64::from_str_radix(&digits.replace('_', ""), radix)
                    .map_err(|_| CfgError::tokenizer(err_msg, start))?;
                let body = format!("0{}{}", marker, digits);
                return Ok(self.finish_integer(&body, sign, magnitude, start));
            }
            // Not a radix prefix: put the '0' back and fall through to
            // ordinary decimal/legacy-octal/float lexing below.
            self.source.push_back('0');
        }

        let mut body = String::new();
        let has_int_digits = self.read_digit_run(&mut body, |c| c.is_ascii_digit(), start)?;
        let mut is_float = false;
        let mut has_frac_digits = false;
        if self.peek_char() == Some('.') {
            body.push(self.source.read().unwrap());
            is_float = true;
            has_frac_digits = self.read_digit_run(&mut body, |c| c.is_ascii_digit(), start)?;
        }
        if !has_int_digits && !has_frac_digits {
            return Err(CfgError::tokenizer("Invalid character in number", start));
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            body.push(self.source.read().unwrap());
            if matches!(self.peek_char(), Some('-') | Some('+')) {
                body.push(self.source.read().unwrap());
            }
            let mut exp_digits = String::new();
            let has_exp_digits = self.read_digit_run(&mut exp_digits, |c| c.is_ascii_digit(), start)?;
            if !has_exp_digits {
                return Err(CfgError::tokenizer("Invalid character in number", start));
            }
            body.push_str(&exp_digits);
            is_float = true;
        }

        let is_complex = matches!(self.peek_char(), Some('j') | Some('J'));
        if is_complex {
            self.source.read();
        }

        let clean: String = body.chars().filter(|c| *c != '_').collect();
        if is_complex {
            let im: f64 = clean
                .parse()
                .map_err(|_| CfgError::tokenizer("Invalid character in number", start))?;
            let im = if sign { -im } else { im };
            let text = format!("{}{}j", if sign { "-" } else { "" }, clean);
            let end = self.source.char_location();
            return Ok(Token::new(
                TokenKind::COMPLEX,
                text,
                Value::Complex(Complex::imaginary(im)),
                start,
                end,
            ));
        }
        if is_float {
            let v: f64 = clean
                .parse()
                .map_err(|_| CfgError::tokenizer("Invalid character in number", start))?;
            let v = if sign { -v } else { v };
            let text = format!("{}{}", if sign { "-" } else { "" }, clean);
            let end = self.source.char_location();
            return Ok(Token::new(TokenKind::FLOAT, text, Value::Float(v), start, end));
        }

        // Legacy leading-zero octal: "0" followed only by octal digits.
        if clean.len() > 1 && clean.starts_with('0') && clean.chars().all(|c| ('0'..='7').contains(&c)) {
            let magnitude = i64::from_str_radix(&clean, 8)
                .map_err(|_| CfgError::tokenizer("Invalid character in number", start))?;
            return Ok(self.finish_integer(&clean, sign, magnitude, start));
        }

        let magnitude: i64 = clean
            .parse()
            .map_err(|_| CfgError::tokenizer("Invalid character in number", start))?;
        Ok(self.finish_integer(&clean, sign, magnitude, start))
    }

    fn finish_integer(&self, body: &str, sign: bool, magnitude: i64, start: Location) -> Token {
        let value = if sign { -magnitude } else { magnitude };
        let text = format!("{}{}", if sign { "-" } else { "" }, body);
        let end = self.source.char_location();
        Token::new(TokenKind::INTEGER, text, Value::Integer(value), start, end)
    }

    fn scan_punctuation(&mut self, c: char, start: Location) -> Result<Token, CfgError> {
        macro_rules! tok {
            ($kind:expr, $text:expr) => {
                Ok(self.make($kind, $text.to_string(), Value::Undefined, start))
            };
        }
        match c {
            ':' => tok!(TokenKind::COLON, ":"),
            '+' => tok!(TokenKind::PLUS, "+"),
            ',' => tok!(TokenKind::COMMA, ","),
            '{' => tok!(TokenKind::LCURLY, "{"),
            '}' => tok!(TokenKind::RCURLY, "}"),
            '[' => tok!(TokenKind::LBRACK, "["),
            ']' => tok!(TokenKind::RBRACK, "]"),
            '(' => tok!(TokenKind::LPAREN, "("),
            ')' => tok!(TokenKind::RPAREN, ")"),
            '@' => tok!(TokenKind::AT, "@"),
            '$' => tok!(TokenKind::DOLLAR, "$"),
            '~' => tok!(TokenKind::TILDE, "~"),
            '^' => tok!(TokenKind::BITXOR, "^"),
            '*' => {
                if self.consume_if('*') {
                    tok!(TokenKind::POWER, "**")
                } else {
                    tok!(TokenKind::STAR, "*")
                }
            }
            '/' => {
                if self.consume_if('/') {
                    tok!(TokenKind::SLASHSLASH, "//")
                } else {
                    tok!(TokenKind::SLASH, "/")
                }
            }
            '%' => tok!(TokenKind::MODULO, "%"),
            '=' => {
                if self.consume_if('=') {
                    tok!(TokenKind::EQ, "==")
                } else {
                    tok!(TokenKind::ASSIGN, "=")
                }
            }
            '!' => {
                if self.consume_if('=') {
                    tok!(TokenKind::NEQ, "!=")
                } else {
                    Err(CfgError::tokenizer("Unexpected character: !", start))
                }
            }
            '<' => {
                if self.consume_if('=') {
                    tok!(TokenKind::LE, "<=")
                } else if self.consume_if('>') {
                    tok!(TokenKind::ALT_NEQ, "<>")
                } else if self.consume_if('<') {
                    tok!(TokenKind::LSHIFT, "<<")
                } else {
                    tok!(TokenKind::LT, "<")
                }
            }
            '>' => {
                if self.consume_if('=') {
                    tok!(TokenKind::GE, ">=")
                } else if self.consume_if('>') {
                    tok!(TokenKind::RSHIFT, ">>")
                } else {
                    tok!(TokenKind::GT, ">")
                }
            }
            '&' => {
                if self.consume_if('&') {
                    tok!(TokenKind::AND, "&&")
                } else {
                    tok!(TokenKind::BITAND, "&")
                }
            }
            '|' => {
                if self.consume_if('|') {
                    tok!(TokenKind::OR, "||")
                } else {
                    tok!(TokenKind::BITOR, "|")
                }
            }
            other => Err(CfgError::tokenizer(format!("Unexpected character: {}", other), start)),
        }
    }

    fn consume_if(&mut self, expected: char) -> bool {
        match self.source.read() {
            Some(c) if c == expected => true,
            Some(c) => {
                self.source.push_back(c);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut t = Tokenizer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = t.get_token().unwrap();
            let done = tok.kind == TokenKind::EOF;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_whitespace_and_comments() {
        let toks = kinds("  # a comment\n  a");
        assert_eq!(
            toks,
            vec![TokenKind::NEWLINE, TokenKind::NEWLINE, TokenKind::WORD, TokenKind::EOF]
        );
    }

    #[test]
    fn recognizes_keywords_and_identifiers() {
        let mut t = Tokenizer::new("true false null is in not and or foo_bar");
        let expect = [
            TokenKind::TRUE,
            TokenKind::FALSE,
            TokenKind::NONE,
            TokenKind::IS,
            TokenKind::IN,
            TokenKind::NOT,
            TokenKind::AND,
            TokenKind::OR,
            TokenKind::WORD,
        ];
        for k in expect {
            assert_eq!(t.get_token().unwrap().kind, k);
        }
    }

    #[test]
    fn decodes_simple_string() {
        let mut t = Tokenizer::new(r#"'Hello, '"#);
        let tok = t.get_token().unwrap();
        assert_eq!(tok.kind, TokenKind::STRING);
        assert_eq!(tok.value, Value::String("Hello, ".to_string()));
    }

    #[test]
    fn decodes_escape_sequences() {
        let mut t = Tokenizer::new(r#""a\nb\x41é""#);
        let tok = t.get_token().unwrap();
        assert_eq!(tok.value, Value::String("a\nbA\u{e9}".to_string()));
    }

    #[test]
    fn rejects_lone_surrogate_escape() {
        let mut t = Tokenizer::new(r#""\ud800""#);
        assert!(t.get_token().is_err());
    }

    #[test]
    fn triple_quoted_strings_span_lines() {
        let mut t = Tokenizer::new("'''a\nb'''");
        let tok = t.get_token().unwrap();
        assert_eq!(tok.value, Value::String("a\nb".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut t = Tokenizer::new("'abc");
        assert!(t.get_token().is_err());
    }

    #[test]
    fn lexes_hex_octal_binary_and_underscored_integers() {
        let mut t = Tokenizer::new("0xFF 0o17 0b101 1_000");
        assert_eq!(t.get_token().unwrap().value, Value::Integer(255));
        assert_eq!(t.get_token().unwrap().value, Value::Integer(15));
        assert_eq!(t.get_token().unwrap().value, Value::Integer(5));
        assert_eq!(t.get_token().unwrap().value, Value::Integer(1000));
    }

    #[test]
    fn legacy_leading_zero_is_octal() {
        let mut t = Tokenizer::new("0755");
        assert_eq!(t.get_token().unwrap().value, Value::Integer(0o755));
    }

    #[test]
    fn lexes_float_and_complex() {
        let mut t = Tokenizer::new("1.5 2e3 4j");
        let a = t.get_token().unwrap();
        assert_eq!(a.kind, TokenKind::FLOAT);
        assert_eq!(a.value, Value::Float(1.5));
        let b = t.get_token().unwrap();
        assert_eq!(b.value, Value::Float(2000.0));
        let c = t.get_token().unwrap();
        assert_eq!(c.kind, TokenKind::COMPLEX);
        assert_eq!(c.value, Value::Complex(Complex::imaginary(4.0)));
    }

    #[test]
    fn underscore_at_start_or_end_is_rejected() {
        let mut t = Tokenizer::new("1_");
        assert!(t.get_token().is_err());
    }

    #[test]
    fn minus_digit_folds_into_number_but_minus_name_is_operator() {
        let toks = kinds("-5 - a");
        assert_eq!(toks[0], TokenKind::INTEGER);
        assert_eq!(toks[1], TokenKind::MINUS);
        assert_eq!(toks[2], TokenKind::WORD);
    }

    #[test]
    fn multi_char_operators() {
        let toks = kinds("<= <> << >= >> == != // ** && ||");
        assert_eq!(
            toks,
            vec![
                TokenKind::LE,
                TokenKind::ALT_NEQ,
                TokenKind::LSHIFT,
                TokenKind::GE,
                TokenKind::RSHIFT,
                TokenKind::EQ,
                TokenKind::NEQ,
                TokenKind::SLASHSLASH,
                TokenKind::POWER,
                TokenKind::AND,
                TokenKind::OR,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn eof_repeats_after_end() {
        let mut t = Tokenizer::new("");
        assert_eq!(t.get_token().unwrap().kind, TokenKind::EOF);
        assert_eq!(t.get_token().unwrap().kind, TokenKind::EOF);
    }

    #[test]
    fn backslash_newline_is_silent_line_continuation() {
        let toks = kinds("a \\\nb");
        assert_eq!(toks, vec![TokenKind::WORD, TokenKind::WORD, TokenKind::EOF]);
    }
}
