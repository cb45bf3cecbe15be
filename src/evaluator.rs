use crate::ast::{BinaryKind, Node, UnaryKind};
use crate::config::Config;
use crate::error::CfgError;
use crate::token::{Complex, TokenKind, Value};
use crate::value::{ListValue, MappingValue, OrderedMap, Position};

/// Evaluate any expression node to a fully materialized [`Value`].
///
/// `Dot`/`Index`/`Colon` chains and `${...}` references both resolve
/// through [`eval_container_chain`] so a bare `a.b` and `${a.b}` behave
/// identically; this is an interpretive choice (recorded in
/// DESIGN.md) since only `${...}` is unambiguously a reference in the
/// source grammar.
pub fn eval_node(config: &Config, node: &Node) -> Result<Value, CfgError> {
    match node {
        Node::Token(t) => eval_token(config, t),
        Node::List { elements, loc: _ } => {
            let mut out = Vec::with_capacity(elements.len());
            for e in elements {
                out.push(eval_node(config, e)?);
            }
            Ok(Value::List(out))
        }
        Node::Mapping { elements, .. } => {
            let mv = MappingValue::new(config.clone(), elements.clone());
            Ok(Value::Mapping(mv.as_plain()?))
        }
        Node::Unary { kind, operand, loc } => eval_unary(config, *kind, operand, *loc),
        Node::Binary {
            kind: BinaryKind::Dot | BinaryKind::Index | BinaryKind::Colon,
            ..
        } => position_to_value(eval_container_chain(config, node)?),
        Node::Binary {
            kind, left, right, ..
        } => eval_binary(config, *kind, left, right),
        Node::Slice { .. } => Err(CfgError::bad_index("A slice cannot be used as a value", Some(node.location()))),
    }
}

fn eval_token(config: &Config, t: &crate::token::Token) -> Result<Value, CfgError> {
    match t.kind {
        TokenKind::BACKTICK => crate::special::convert(config, &t.value.string_for(), t.start),
        TokenKind::WORD => config.options().context.get(&t.text).cloned().ok_or_else(|| {
            CfgError::config_at(format!("Unknown variable: {}", t.text), t.start)
        }),
        _ => Ok(t.value.clone()),
    }
}

fn eval_unary(config: &Config, kind: UnaryKind, operand: &Node, loc: crate::location::Location) -> Result<Value, CfgError> {
    match kind {
        UnaryKind::Not => {
            let v = eval_node(config, operand)?;
            Ok(Value::Bool(!v.is_truthy()))
        }
        UnaryKind::Plus => numeric_unary(eval_node(config, operand)?, loc, |i| i, |f| f, |c| c),
        UnaryKind::Minus => numeric_unary(eval_node(config, operand)?, loc, |i| -i, |f| -f, |c| Complex::new(-c.re, -c.im)),
        UnaryKind::Tilde => match eval_node(config, operand)? {
            Value::Integer(i) => Ok(Value::Integer(!i)),
            other => Err(type_error("integer", &other, loc)),
        },
        UnaryKind::At | UnaryKind::Dollar => position_to_value(resolve_to_position(config, &Node::Unary {
            kind,
            operand: Box::new(operand.clone()),
            loc,
        })?),
    }
}

fn numeric_unary(
    v: Value,
    loc: crate::location::Location,
    fi: impl Fn(i64) -> i64,
    ff: impl Fn(f64) -> f64,
    fc: impl Fn(Complex) -> Complex,
) -> Result<Value, CfgError> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(fi(i))),
        Value::Float(f) => Ok(Value::Float(ff(f))),
        Value::Complex(c) => Ok(Value::Complex(fc(c))),
        other => Err(type_error("number", &other, loc)),
    }
}

fn type_error(expected: &str, found: &Value, loc: crate::location::Location) -> CfgError {
    CfgError::config_at(format!("{} required, but found {}", expected, found.string_for()), loc)
}

/// `unable to <op> <lhs> and/by <rhs>`, naming the operator symbol and
/// rendering both operand values (spec.md §4.6's arithmetic failure
/// text), used everywhere a numeric binary operator's operands don't
/// both promote to a common numeric type.
fn arithmetic_error(op: &str, lhs: &Value, rhs: &Value, loc: crate::location::Location) -> CfgError {
    let conj = if matches!(op, "/" | "//") { "by" } else { "and" };
    CfgError::config_at(
        format!("unable to {} {} {} {}", op, lhs.string_for(), conj, rhs.string_for()),
        loc,
    )
}

/// A value's place in the numeric promotion order: integer < float <
/// complex, matching the literal tokens' own hierarchy.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
    Complex(Complex),
}

fn as_num(v: &Value) -> Option<Num> {
    match v {
        Value::Integer(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::Complex(c) => Some(Num::Complex(*c)),
        Value::Bool(b) => Some(Num::Int(if *b { 1 } else { 0 })),
        _ => None,
    }
}

fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn eval_binary(config: &Config, kind: BinaryKind, left: &Node, right: &Node) -> Result<Value, CfgError> {
    let loc = left.location();
    match kind {
        BinaryKind::Or => {
            let l = eval_node(config, left)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval_node(config, right)
            }
        }
        BinaryKind::And => {
            let l = eval_node(config, left)?;
            if !l.is_truthy() {
                Ok(l)
            } else {
                eval_node(config, right)
            }
        }
        BinaryKind::Is => Ok(Value::Bool(eval_node(config, left)? == eval_node(config, right)?)),
        BinaryKind::IsNot => Ok(Value::Bool(eval_node(config, left)? != eval_node(config, right)?)),
        BinaryKind::Eq | BinaryKind::Ne | BinaryKind::AltNe => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            let eq = values_equal(&l, &r);
            Ok(Value::Bool(if matches!(kind, BinaryKind::Eq) { eq } else { !eq }))
        }
        BinaryKind::Lt | BinaryKind::Le | BinaryKind::Gt | BinaryKind::Ge => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            let ord = compare(&l, &r, loc)?;
            let result = match kind {
                BinaryKind::Lt => ord.is_lt(),
                BinaryKind::Le => ord.is_le(),
                BinaryKind::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinaryKind::In | BinaryKind::NotIn => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            let contains = match &r {
                Value::List(items) => items.iter().any(|item| values_equal(item, &l)),
                Value::String(s) => match &l {
                    Value::String(needle) => s.contains(needle.as_str()),
                    _ => return Err(type_error("string", &l, loc)),
                },
                Value::Mapping(m) => match &l {
                    Value::String(k) => m.contains_key(k),
                    _ => return Err(type_error("string key", &l, loc)),
                },
                other => return Err(type_error("list, string, or mapping", other, loc)),
            };
            Ok(Value::Bool(if matches!(kind, BinaryKind::In) {
                contains
            } else {
                !contains
            }))
        }
        BinaryKind::BitOr | BinaryKind::BitXor | BinaryKind::BitAnd | BinaryKind::LShift | BinaryKind::RShift => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            match (l, r) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(match kind {
                    BinaryKind::BitOr => a | b,
                    BinaryKind::BitXor => a ^ b,
                    BinaryKind::BitAnd => a & b,
                    BinaryKind::LShift => a << b,
                    _ => a >> b,
                })),
                (a, _) => Err(type_error("integer", &a, loc)),
            }
        }
        BinaryKind::Add => eval_add(config, left, right, loc),
        BinaryKind::Sub => eval_sub(config, left, right, loc),
        BinaryKind::Mul => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            arithmetic(l, r, loc, "*", |a, b| a.wrapping_mul(b), |a, b| a * b, |a, b| {
                Complex::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
            })
        }
        BinaryKind::Div => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            match (as_num(&l), as_num(&r)) {
                (Some(a), Some(b)) => {
                    let (af, bf) = (promote_f64(a), promote_f64(b));
                    if bf == 0.0 {
                        return Err(CfgError::config_at("Division by zero", loc));
                    }
                    Ok(Value::Float(af / bf))
                }
                _ => Err(arithmetic_error("/", &l, &r, loc)),
            }
        }
        BinaryKind::FloorDiv => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        return Err(CfgError::config_at("Division by zero", loc));
                    }
                    Ok(Value::Integer(floor_div_i64(*a, *b)))
                }
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float((a / b).floor())),
                _ => Err(arithmetic_error("//", &l, &r, loc)),
            }
        }
        BinaryKind::Mod => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        return Err(CfgError::config_at("Division by zero", loc));
                    }
                    Ok(Value::Integer(a.rem_euclid(*b)))
                }
                _ => Err(arithmetic_error("%", &l, &r, loc)),
            }
        }
        BinaryKind::Pow => {
            let l = eval_node(config, left)?;
            let r = eval_node(config, right)?;
            match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) if *b >= 0 => Ok(Value::Integer(a.pow(*b as u32))),
                _ => {
                    let (af, bf) = (as_num(&l).map(promote_f64), as_num(&r).map(promote_f64));
                    match (af, bf) {
                        (Some(af), Some(bf)) => Ok(Value::Float(af.powf(bf))),
                        _ => Err(arithmetic_error("**", &l, &r, loc)),
                    }
                }
            }
        }
        BinaryKind::Dot | BinaryKind::Index | BinaryKind::Colon => {
            unreachable!("eval_node dispatches Dot/Index/Colon to eval_container_chain directly")
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(na), Some(nb)) = (as_num(a), as_num(b)) {
        return promote_complex(na) == promote_complex(nb);
    }
    a == b
}

fn compare(a: &Value, b: &Value, loc: crate::location::Location) -> Result<std::cmp::Ordering, CfgError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => match (as_num(a), as_num(b)) {
            (Some(x), Some(y)) => promote_f64(x)
                .partial_cmp(&promote_f64(y))
                .ok_or_else(|| CfgError::config_at("Values are not comparable", loc)),
            _ => Err(CfgError::config_at(
                format!("Cannot compare {} and {}", a.string_for(), b.string_for()),
                loc,
            )),
        },
    }
}

fn promote_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
        Num::Complex(c) => c.re,
    }
}

fn promote_complex(n: Num) -> Complex {
    match n {
        Num::Int(i) => Complex::new(i as f64, 0.0),
        Num::Float(f) => Complex::new(f, 0.0),
        Num::Complex(c) => c,
    }
}

fn arithmetic(
    l: Value,
    r: Value,
    loc: crate::location::Location,
    op: &str,
    fi: impl Fn(i64, i64) -> i64,
    ff: impl Fn(f64, f64) -> f64,
    fc: impl Fn(Complex, Complex) -> Complex,
) -> Result<Value, CfgError> {
    match (as_num(&l), as_num(&r)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Value::Integer(fi(a, b))),
        (Some(a), Some(b)) if matches!(a, Num::Complex(_)) || matches!(b, Num::Complex(_)) => {
            Ok(Value::Complex(fc(promote_complex(a), promote_complex(b))))
        }
        (Some(a), Some(b)) => Ok(Value::Float(ff(promote_f64(a), promote_f64(b)))),
        _ => Err(arithmetic_error(op, &l, &r, loc)),
    }
}

fn eval_add(config: &Config, left: &Node, right: &Node, loc: crate::location::Location) -> Result<Value, CfgError> {
    let l = eval_node(config, left)?;
    let r = eval_node(config, right)?;
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (Value::Mapping(a), Value::Mapping(b)) => Ok(Value::Mapping(merge_mappings(&a, &b))),
        (a, b) => arithmetic(a, b, loc, "+", |x, y| x.wrapping_add(y), |x, y| x + y, |x, y| {
            Complex::new(x.re + y.re, x.im + y.im)
        }),
    }
}

fn eval_sub(config: &Config, left: &Node, right: &Node, loc: crate::location::Location) -> Result<Value, CfgError> {
    let l = eval_node(config, left)?;
    let r = eval_node(config, right)?;
    match (l, r) {
        (Value::Mapping(a), Value::Mapping(b)) => {
            let mut out = OrderedMap::new();
            for (k, v) in a.iter() {
                if !b.contains_key(k) {
                    out.insert(k, v.clone());
                }
            }
            Ok(Value::Mapping(out))
        }
        (Value::List(a), Value::List(b)) => {
            let out: Vec<Value> = a.into_iter().filter(|item| !b.iter().any(|x| values_equal(item, x))).collect();
            Ok(Value::List(out))
        }
        (a, b) => arithmetic(a, b, loc, "-", |x, y| x.wrapping_sub(y), |x, y| x - y, |x, y| {
            Complex::new(x.re - y.re, x.im - y.im)
        }),
    }
}

/// Deep-merge two mappings: keys unique to either side pass through,
/// shared keys whose values are both mappings merge recursively,
/// otherwise the right side wins.
fn merge_mappings(a: &OrderedMap, b: &OrderedMap) -> OrderedMap {
    let mut out = OrderedMap::new();
    for (k, v) in a.iter() {
        out.insert(k, v.clone());
    }
    for (k, v) in b.iter() {
        match (out.get(k), v) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                let merged = merge_mappings(existing, incoming);
                out.insert(k, Value::Mapping(merged));
            }
            _ => out.insert(k, v.clone()),
        }
    }
    out
}

/// Resolve a `Dot`/`Index`/`Colon` chain (or a bare root `WORD`) to its
/// lazy [`Position`], without fully materializing containers along the
/// way — only the nodes actually visited get evaluated.
pub fn eval_container_chain(config: &Config, node: &Node) -> Result<Position, CfgError> {
    match node {
        Node::Token(t) if t.kind == TokenKind::WORD => {
            let root = config.root();
            let child = root
                .base_get(&t.text)
                .ok_or_else(|| CfgError::config_at(format!("Not found in configuration: {}", t.text), t.start))?;
            resolve_to_position(root.config(), child)
        }
        Node::Binary {
            kind: BinaryKind::Dot,
            left,
            right,
            loc,
        } => {
            let base = eval_container_chain(config, left)?;
            let key = match &**right {
                Node::Token(t) => &t.text,
                _ => return Err(CfgError::config_at("Expected an identifier after '.'", *loc)),
            };
            match base {
                Position::Mapping(m) => {
                    let child = m
                        .base_get(key)
                        .ok_or_else(|| CfgError::config_at(format!("Not found in configuration: {}", key), *loc))?;
                    resolve_to_position(m.config(), child)
                }
                other => Err(type_error("mapping", &position_preview(&other), *loc)),
            }
        }
        Node::Binary {
            kind: BinaryKind::Index,
            left,
            right,
            loc,
        } => {
            let base = eval_container_chain(config, left)?;
            match base {
                Position::List(l) => {
                    let idx = eval_node(config, right)?;
                    let idx = match idx {
                        Value::Integer(i) => i,
                        other => {
                            return Err(CfgError::bad_index(
                                format!("integer required, but found {}", other.string_for()),
                                Some(*loc),
                            ))
                        }
                    };
                    let child = l.base_get(idx)?;
                    resolve_to_position(l.config(), child)
                }
                Position::Mapping(m) => {
                    let idx = eval_node(config, right)?;
                    let key = match idx {
                        Value::String(s) => s,
                        other => return Err(type_error("string index", &other, *loc)),
                    };
                    let child = m
                        .base_get(&key)
                        .ok_or_else(|| CfgError::config_at(format!("Not found in configuration: {}", key), *loc))?;
                    resolve_to_position(m.config(), child)
                }
                other => Err(type_error("list or mapping", &position_preview(&other), *loc)),
            }
        }
        Node::Binary {
            kind: BinaryKind::Colon,
            left,
            right,
            loc,
        } => {
            let base = eval_container_chain(config, left)?;
            let (start, stop, step) = match &**right {
                Node::Slice { start, stop, step, .. } => (
                    eval_slice_bound(config, start.as_deref())?,
                    eval_slice_bound(config, stop.as_deref())?,
                    eval_slice_bound(config, step.as_deref())?,
                ),
                _ => return Err(CfgError::config_at("Expected a slice", *loc)),
            };
            match base {
                Position::List(l) => Ok(Position::Scalar(Value::List(l.slice(start, stop, step)?))),
                _ => Err(CfgError::bad_index("slices can only operate on lists", Some(*loc))),
            }
        }
        other => resolve_to_position(config, other),
    }
}

fn eval_slice_bound(config: &Config, node: Option<&Node>) -> Result<Option<i64>, CfgError> {
    match node {
        None => Ok(None),
        Some(n) => match eval_node(config, n)? {
            Value::Integer(i) => Ok(Some(i)),
            other => Err(CfgError::bad_index(
                format!("integer required, but found {}", other.string_for()),
                Some(n.location()),
            )),
        },
    }
}

/// A lightweight stand-in `Value` used only to name a `Position`'s shape
/// in a type-mismatch error message.
fn position_preview(pos: &Position) -> Value {
    match pos {
        Position::Scalar(v) => v.clone(),
        Position::Mapping(_) => Value::Mapping(OrderedMap::new()),
        Position::List(_) => Value::List(Vec::new()),
    }
}

/// Resolve a single AST node to a [`Position`], transparently following
/// `${...}` references and `@`-includes so that, e.g., `a.b` continues
/// to walk through `b` even when `a` itself was `${elsewhere}`.
fn resolve_to_position(config: &Config, node: &Node) -> Result<Position, CfgError> {
    match node {
        Node::Mapping { elements, .. } => Ok(Position::Mapping(MappingValue::new(config.clone(), elements.clone()))),
        Node::List { elements, .. } => Ok(Position::List(ListValue::new(config.clone(), elements.clone()))),
        Node::Unary {
            kind: UnaryKind::Dollar,
            operand,
            loc,
        } => {
            config.push_ref(operand, *loc)?;
            let result = eval_container_chain(config, operand);
            config.pop_ref();
            result
        }
        Node::Unary {
            kind: UnaryKind::At,
            operand,
            loc,
        } => {
            let path = match eval_node(config, operand)? {
                Value::String(s) => s,
                other => {
                    return Err(CfgError::config_at(
                        format!("@ operand must be a string, but is {}", other.string_for()),
                        *loc,
                    ))
                }
            };
            crate::include::resolve_include(config, &path, *loc)
        }
        other => Ok(Position::Scalar(eval_node(config, other)?)),
    }
}

/// Fully materialize a [`Position`] into a [`Value`].
pub fn position_to_value(pos: Position) -> Result<Value, CfgError> {
    match pos {
        Position::Scalar(v) => Ok(v),
        Position::Mapping(m) => Ok(Value::Mapping(m.as_plain()?)),
        Position::List(l) => Ok(Value::List(l.as_plain()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;

    fn value_of(src: &str, key: &str) -> Value {
        let cfg = Config::new(src, Options::default()).unwrap();
        cfg.get(key, None).unwrap()
    }

    #[test]
    fn arithmetic_promotes_across_numeric_types() {
        assert_eq!(value_of("a: 1 + 2\n", "a"), Value::Integer(3));
        assert_eq!(value_of("a: 1 + 2.0\n", "a"), Value::Float(3.0));
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(value_of("a: -7 // 2\n", "a"), Value::Integer(-4));
        assert_eq!(value_of("a: 7 // 2\n", "a"), Value::Integer(3));
    }

    #[test]
    fn string_and_list_concatenation() {
        assert_eq!(value_of("a: 'x' + 'y'\n", "a"), Value::String("xy".to_string()));
        assert_eq!(
            value_of("a: [1] + [2]\n", "a"),
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn mapping_merge_is_recursive_and_right_wins() {
        let v = value_of("a: {x: {p: 1, q: 2}} + {x: {q: 3, r: 4}}\n", "a");
        match v {
            Value::Mapping(m) => match m.get("x") {
                Some(Value::Mapping(inner)) => {
                    assert_eq!(inner.get("p"), Some(&Value::Integer(1)));
                    assert_eq!(inner.get("q"), Some(&Value::Integer(3)));
                    assert_eq!(inner.get("r"), Some(&Value::Integer(4)));
                }
                _ => panic!("expected nested mapping"),
            },
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn mapping_subtract_removes_right_hand_keys() {
        let v = value_of("a: {x: 1, y: 2} - {y: 0}\n", "a");
        match v {
            Value::Mapping(m) => {
                assert!(m.contains_key("x"));
                assert!(!m.contains_key("y"));
            }
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn reference_resolves_dotted_path() {
        assert_eq!(
            value_of("a: {b: 42}\nc: ${a.b}\n", "c"),
            Value::Integer(42)
        );
    }

    #[test]
    fn bare_path_without_dollar_also_resolves() {
        assert_eq!(value_of("a: {b: 42}\nc: a.b\n", "c"), Value::Integer(42));
    }

    #[test]
    fn bare_word_expression_looks_up_the_injected_context() {
        let mut context = OrderedMap::new();
        context.insert("retries", Value::Integer(3));
        let options = Options {
            context,
            ..Options::default()
        };
        let cfg = Config::new("timeout: retries * 10\n", options).unwrap();
        assert_eq!(cfg.get("timeout", None).unwrap(), Value::Integer(30));
    }

    #[test]
    fn bare_word_expression_without_a_matching_context_entry_is_unknown_variable() {
        let cfg = Config::new("a: retries\n", Options::default()).unwrap();
        let err = cfg.get("a", None).unwrap_err();
        assert!(format!("{}", err).contains("Unknown variable: retries"));
    }

    #[test]
    fn list_index_out_of_range_reports_valid_bounds() {
        let cfg = Config::new("a: [1, 2, 3, 4, 5, 6, 7]\n", Options::default()).unwrap();
        let err = cfg.get("a[7]", None).unwrap_err();
        assert!(matches!(err, CfgError::BadIndex { .. }));
        assert!(format!("{}", err).contains("index out of range: is 7, must be between 0 and 6"));
    }

    #[test]
    fn missing_mapping_key_reports_not_found_in_configuration() {
        let cfg = Config::new("a: {x: 1}\n", Options::default()).unwrap();
        let err = cfg.get("a.y", None).unwrap_err();
        assert!(format!("{}", err).contains("Not found in configuration: y"));
    }

    #[test]
    fn slicing_a_non_list_reports_the_literal_spec_message() {
        let cfg = Config::new("a: {x: 1}[0:1]\n", Options::default()).unwrap();
        let err = cfg.get("a", None).unwrap_err();
        assert!(matches!(err, CfgError::BadIndex { .. }));
        assert!(format!("{}", err).contains("slices can only operate on lists"));
    }

    #[test]
    fn float_modulo_is_a_type_error() {
        let cfg = Config::new("a: 1.5 % 2.0\n", Options::default()).unwrap();
        assert!(cfg.get("a", None).is_err());
    }

    #[test]
    fn at_operand_must_be_a_string() {
        let cfg = Config::new("a: @ 5\n", Options::default()).unwrap();
        let err = cfg.get("a", None).unwrap_err();
        assert!(format!("{}", err).contains("@ operand must be a string, but is 5"));
    }

    #[test]
    fn list_slice_is_python_style() {
        assert_eq!(
            value_of("a: [1, 2, 3, 4][1:3]\n", "a"),
            Value::List(vec![Value::Integer(2), Value::Integer(3)])
        );
    }

    #[test]
    fn direct_self_reference_is_a_circular_reference_error() {
        let cfg = Config::new("a: ${a}\n", Options::default()).unwrap();
        let err = cfg.get("a", None).unwrap_err();
        assert!(matches!(err, CfgError::CircularReference { .. }));
    }

    #[test]
    fn comparison_and_membership() {
        assert_eq!(value_of("a: 1 < 2\n", "a"), Value::Bool(true));
        assert_eq!(value_of("a: 2 in [1, 2, 3]\n", "a"), Value::Bool(true));
        assert_eq!(value_of("a: 'q' not in [1, 2, 3]\n", "a"), Value::Bool(true));
    }
}
