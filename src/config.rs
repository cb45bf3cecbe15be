use crate::ast::Node;
use crate::error::CfgError;
use crate::location::Location;
use crate::parser::Parser;
use crate::path::{parse_path, to_source};
use crate::token::Value;
use crate::tokenizer::Trace;
use crate::value::{MappingValue, OrderedMap};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Library-wide knobs, set on a [`Config`] before or after construction.
/// Grounded on the teacher's options-bag pattern for its top-level
/// driver type: a small `Clone`-able struct of toggles rather than a
/// constructor with a dozen positional arguments.
#[derive(Debug, Clone)]
pub struct Options {
    /// Reject a document containing a duplicate top-level-reachable key
    /// at the same mapping level (spec.md §4.6).
    pub no_duplicates: bool,
    /// Require special-value conversions (env var, object path, ISO
    /// date-time) to succeed rather than silently falling back to a
    /// plain string / `Value::Null`.
    pub strict_conversions: bool,
    /// Extra directories searched, in order, for `@`-included files not
    /// found relative to the including document.
    pub include_path: Vec<PathBuf>,
    /// Arbitrary host data available to the dotted-object-path special
    /// value (`` `a.b.c` ``) and to bare-`WORD` expression lookups via an
    /// injected mapping.
    pub context: OrderedMap,
    /// Whether a resolved top-level key's value is memoized across
    /// repeated `Config::get` calls. Off by default: each call walks
    /// the path fresh, so an environment variable or `@`-included file
    /// that changes between calls is always picked up; turning this on
    /// trades that freshness for not re-walking/re-reading on repeat
    /// lookups of the same key.
    pub cached: bool,
    /// Debug-only trace level for `Config::get` path walks and cache
    /// hits/misses (`cfg(debug_assertions)` only; see [`Trace`]).
    pub trace: Trace,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            no_duplicates: true,
            strict_conversions: true,
            include_path: Vec::new(),
            context: OrderedMap::new(),
            cached: false,
            trace: Trace::None,
        }
    }
}

struct ConfigInner {
    root: Node,
    options: Options,
    source_dir: Option<PathBuf>,
    refs_seen: RefCell<Vec<(String, Location)>>,
    cache: RefCell<std::collections::HashMap<String, Value>>,
}

/// A loaded CFG document.
///
/// `Config` is a cheap-to-clone `Rc` handle: wrapper types produced
/// while walking a path ([`MappingValue`], [`ListValue`]) hold an owned
/// clone rather than a borrow, sidestepping the self-referential-struct
/// problem that would come from a sub-value pointing back at the
/// `Config` that owns its AST.
#[derive(Clone)]
pub struct Config {
    inner: Rc<ConfigInner>,
}

impl Config {
    /// Parse `text` as a full document (root must be a mapping).
    pub fn new(text: &str, options: Options) -> Result<Self, CfgError> {
        Self::from_parts(text, options, None)
    }

    /// Parse `text`, recording `path`'s parent directory as the base for
    /// relative `@`-includes.
    pub fn load_file(path: impl AsRef<Path>, options: Options) -> Result<Self, CfgError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CfgError::config(format!("unable to read {}: {}", path.display(), e)))?;
        let dir = path.parent().map(|p| p.to_path_buf());
        Self::from_parts(&text, options, dir)
    }

    fn from_parts(text: &str, options: Options, source_dir: Option<PathBuf>) -> Result<Self, CfgError> {
        let mut parser = Parser::new(text)?;
        let root = parser.parse_document()?;
        if options.no_duplicates {
            check_duplicates(&root)?;
        }
        Ok(Self {
            inner: Rc::new(ConfigInner {
                root,
                options,
                source_dir,
                refs_seen: RefCell::new(Vec::new()),
                cache: RefCell::new(std::collections::HashMap::new()),
            }),
        })
    }

    /// Build a `Config` around an already-parsed, non-mapping root
    /// (used for `@`-included files whose top level is a list or a
    /// scalar). Inherits `options`/`source_dir` for nested includes and
    /// reference resolution.
    pub(crate) fn from_root(root: Node, options: Options, source_dir: Option<PathBuf>) -> Self {
        Self {
            inner: Rc::new(ConfigInner {
                root,
                options,
                source_dir,
                refs_seen: RefCell::new(Vec::new()),
                cache: RefCell::new(std::collections::HashMap::new()),
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.inner.source_dir.as_deref()
    }

    pub fn root_node(&self) -> &Node {
        &self.inner.root
    }

    /// The top-level document as a [`MappingValue`]. Panics if this
    /// `Config` was built from a non-mapping root via `from_root` — only
    /// reachable internally by the include resolver, which never calls
    /// this on an `Other` result.
    pub fn root(&self) -> MappingValue {
        match &self.inner.root {
            Node::Mapping { elements, .. } => MappingValue::new(self.clone(), elements.clone()),
            _ => unreachable!("Config::root called on a non-mapping document"),
        }
    }

    /// Fetch `key` — a bare top-level key or a dotted/indexed path — with
    /// per-top-level-key lazy evaluation and caching (spec.md §4.5: no
    /// partial-path cache; the unit of memoization is the top-level
    /// key).
    pub fn get(&self, key: &str, default: Option<Value>) -> Result<Value, CfgError> {
        let top_level = top_level_key(key);
        if self.inner.options.cached {
            if let Some(cached) = self.inner.cache.borrow().get(top_level) {
                if top_level == key {
                    if self.inner.options.trace >= Trace::Eval {
                        #[cfg(debug_assertions)]
                        println!("eval: cache hit for {}", key);
                    }
                    return Ok(cached.clone());
                }
            }
        }
        if self.inner.options.trace >= Trace::Eval {
            #[cfg(debug_assertions)]
            println!("eval: cache miss for {}, resolving path", key);
        }
        let result = self.get_uncached(key);
        match result {
            Ok(value) => {
                if self.inner.options.cached && top_level == key {
                    self.inner
                        .cache
                        .borrow_mut()
                        .insert(top_level.to_string(), value.clone());
                }
                Ok(value)
            }
            Err(e) if !e.always_propagates() => {
                if let Some(default) = default {
                    Ok(default)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    fn get_uncached(&self, key: &str) -> Result<Value, CfgError> {
        let node = parse_path(key)?;
        if self.inner.options.trace >= Trace::Eval {
            #[cfg(debug_assertions)]
            println!("eval: walking path {}", to_source(&node));
        }
        let pos = crate::evaluator::eval_container_chain(self, &node)?;
        crate::evaluator::position_to_value(pos)
    }

    /// Materialize the whole document as a plain [`OrderedMap`].
    pub fn as_dict(&self) -> Result<OrderedMap, CfgError> {
        self.root().as_plain()
    }

    /// Convert a bare string through the special-value rules (spec.md
    /// §4.7) as if it had appeared as a backtick-delimited literal.
    pub fn convert_string(&self, s: &str) -> Result<Value, CfgError> {
        crate::special::convert(self, s, Location::start())
    }

    pub(crate) fn push_ref(&self, node: &Node, loc: Location) -> Result<(), CfgError> {
        let key = to_source(node);
        let mut seen = self.inner.refs_seen.borrow_mut();
        if seen.iter().any(|(k, _)| *k == key) {
            let mut involved: Vec<String> = seen.iter().map(|(k, _)| k.clone()).collect();
            involved.push(key);
            involved.sort();
            involved.dedup();
            return Err(CfgError::circular_reference(involved.join(", ")));
        }
        seen.push((key, loc));
        Ok(())
    }

    pub(crate) fn pop_ref(&self) {
        self.inner.refs_seen.borrow_mut().pop();
    }

    pub(crate) fn clear_refs(&self) {
        self.inner.refs_seen.borrow_mut().clear();
    }
}

fn top_level_key(path: &str) -> &str {
    let dot = path.find(['.', '[']).unwrap_or(path.len());
    &path[..dot]
}

fn check_duplicates(root: &Node) -> Result<(), CfgError> {
    if let Node::Mapping { elements, .. } = root {
        let mut seen: std::collections::HashMap<&str, Location> = std::collections::HashMap::new();
        for (key, _) in elements {
            if let Some(prev) = seen.get(key.text.as_str()) {
                return Err(CfgError::parser(
                    format!(
                        "Duplicate key {} seen at {} (previously at {})",
                        key.text, key.start, prev
                    ),
                    key.start,
                ));
            }
            seen.insert(key.text.as_str(), key.start);
        }
        for (_, value) in elements {
            check_duplicates_nested(value)?;
        }
    }
    Ok(())
}

fn check_duplicates_nested(node: &Node) -> Result<(), CfgError> {
    match node {
        Node::Mapping { .. } => check_duplicates(node),
        Node::List { elements, .. } => {
            for e in elements {
                check_duplicates_nested(e)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_flat_document_and_gets_values() {
        let cfg = Config::new("a: 1\nb: 'x'\n", Options::default()).unwrap();
        assert_eq!(cfg.get("a", None).unwrap(), Value::Integer(1));
        assert_eq!(cfg.get("b", None).unwrap(), Value::String("x".to_string()));
    }

    #[test]
    fn dotted_and_indexed_path_access() {
        let cfg = Config::new("a: {b: [10, 20, 30]}\n", Options::default()).unwrap();
        assert_eq!(cfg.get("a.b[1]", None).unwrap(), Value::Integer(20));
    }

    #[test]
    fn duplicate_top_level_key_is_rejected() {
        let err = Config::new("a: 1\na: 2\n", Options::default()).unwrap_err();
        assert!(format!("{}", err).contains("Duplicate key a"));
    }

    #[test]
    fn missing_key_without_default_errors() {
        let cfg = Config::new("a: 1\n", Options::default()).unwrap();
        assert!(cfg.get("nope", None).is_err());
    }

    #[test]
    fn missing_key_with_default_falls_back() {
        let cfg = Config::new("a: 1\n", Options::default()).unwrap();
        assert_eq!(cfg.get("nope", Some(Value::Integer(0))).unwrap(), Value::Integer(0));
    }

    #[test]
    fn caching_is_off_by_default_so_repeat_lookups_see_env_changes() {
        std::env::set_var("CFG_RS_TEST_CONFIG_CACHE_VAR", "first");
        let cfg = Config::new("a: `$CFG_RS_TEST_CONFIG_CACHE_VAR`\n", Options::default()).unwrap();
        assert_eq!(cfg.get("a", None).unwrap(), Value::String("first".to_string()));
        std::env::set_var("CFG_RS_TEST_CONFIG_CACHE_VAR", "second");
        assert_eq!(cfg.get("a", None).unwrap(), Value::String("second".to_string()));
        std::env::remove_var("CFG_RS_TEST_CONFIG_CACHE_VAR");
    }

    #[test]
    fn cached_option_memoizes_the_first_resolved_value() {
        std::env::set_var("CFG_RS_TEST_CONFIG_CACHE_VAR_2", "first");
        let options = Options {
            cached: true,
            ..Options::default()
        };
        let cfg = Config::new("a: `$CFG_RS_TEST_CONFIG_CACHE_VAR_2`\n", options).unwrap();
        assert_eq!(cfg.get("a", None).unwrap(), Value::String("first".to_string()));
        std::env::set_var("CFG_RS_TEST_CONFIG_CACHE_VAR_2", "second");
        assert_eq!(cfg.get("a", None).unwrap(), Value::String("first".to_string()));
        std::env::remove_var("CFG_RS_TEST_CONFIG_CACHE_VAR_2");
    }

    #[test]
    fn as_dict_materializes_whole_document() {
        let cfg = Config::new("a: 1\nb: 2\n", Options::default()).unwrap();
        let dict = cfg.as_dict().unwrap();
        assert_eq!(dict.get("a"), Some(&Value::Integer(1)));
        assert_eq!(dict.get("b"), Some(&Value::Integer(2)));
    }
}
