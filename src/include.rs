use crate::ast::Node;
use crate::config::Config;
use crate::error::CfgError;
use crate::location::Location;
use crate::parser::Parser;
use crate::value::{ListValue, MappingValue, Position};
use std::path::PathBuf;

/// Resolve an `@ "path"` include (spec.md §4.8): locate the file, parse
/// it as a standalone document (whose root may be a mapping, a list, or
/// a scalar, unlike the top-level document), and fold it back into a
/// [`Position`] the path walker can keep navigating through.
///
/// Resolution order mirrors a typical module/include search: an
/// absolute path is used as-is; a relative path is tried first against
/// the including document's own directory, then against each directory
/// in `Options::include_path`, in order.
pub(crate) fn resolve_include(config: &Config, path: &str, loc: Location) -> Result<Position, CfgError> {
    let resolved = locate(config, path, loc)?;
    let text = std::fs::read_to_string(&resolved)
        .map_err(|e| CfgError::config_at(format!("unable to read {}: {}", path, e), loc))?;

    let mut parser = Parser::new(&text)?;
    let root = parser.parse_value_document()?;

    let child_options = config.options().clone();
    let child_dir = resolved.parent().map(|p| p.to_path_buf());
    let child = Config::from_root(root.clone(), child_options, child_dir);

    Ok(match root {
        Node::Mapping { elements, .. } => Position::Mapping(MappingValue::new(child, elements)),
        Node::List { elements, .. } => Position::List(ListValue::new(child, elements)),
        other => Position::Scalar(crate::evaluator::eval_node(&child, &other)?),
    })
}

fn locate(config: &Config, path: &str, loc: Location) -> Result<PathBuf, CfgError> {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        return if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(CfgError::config_at(format!("unable to locate {}", path), loc))
        };
    }

    if let Some(dir) = config.source_dir() {
        let joined = dir.join(&candidate);
        if joined.is_file() {
            return Ok(joined);
        }
    }

    for dir in &config.options().include_path {
        let joined = dir.join(&candidate);
        if joined.is_file() {
            return Ok(joined);
        }
    }

    Err(CfgError::config_at(format!("unable to locate {}", path), loc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::token::Value;

    #[test]
    fn include_resolves_relative_to_including_file() {
        let dir = std::env::temp_dir().join(format!("cfg_rs_include_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("child.cfg"), "x: 42\n").unwrap();
        let main_path = dir.join("main.cfg");
        std::fs::write(&main_path, "a: @ \"child.cfg\"\n").unwrap();

        let cfg = Config::load_file(&main_path, Options::default()).unwrap();
        assert_eq!(cfg.get("a.x", None).unwrap(), Value::Integer(42));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_include_is_an_error() {
        let dir = std::env::temp_dir().join(format!("cfg_rs_include_test_missing_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let main_path = dir.join("main.cfg");
        std::fs::write(&main_path, "a: @ \"nope.cfg\"\n").unwrap();

        let cfg = Config::load_file(&main_path, Options::default()).unwrap();
        assert!(cfg.get("a", None).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
