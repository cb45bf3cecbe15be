use crate::config::Config;
use crate::error::CfgError;
use crate::location::Location;
use crate::token::{ConfigDateTime, Value};
use once_cell::sync::Lazy;
use regex::Regex;

/// Special-value conversion rules applied to every backtick-delimited
/// literal (spec.md §4.7): an ISO date-time, an environment-variable
/// lookup with an optional default, a dotted lookup into the injected
/// host context, or `${...}` string interpolation. A backtick string
/// matching none of these is returned as a plain string.
pub fn convert(config: &Config, text: &str, loc: Location) -> Result<Value, CfgError> {
    if let Some(dt) = try_datetime(text) {
        return Ok(Value::DateTime(dt));
    }
    if let Some(caps) = ENV_VAR_RE.captures(text) {
        return convert_env_var(config, &caps, loc);
    }
    if let Some(caps) = OBJECT_PATH_RE.captures(text) {
        return convert_object_path(config, &caps, text);
    }
    if text.contains("${") {
        return interpolate(config, text, loc);
    }
    if config.options().strict_conversions {
        return Err(CfgError::config_at(format!("unable to convert string '{}'", text), loc));
    }
    Ok(Value::String(text.to_string()))
}

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(?P<name>[A-Za-z_][A-Za-z0-9_]*)(\|(?P<default>.*))?$").unwrap());

static OBJECT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<path>[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)$").unwrap());

static ISO_DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>\d{4}-\d{2}-\d{2})([ T](?P<time>\d{2}:\d{2}(:\d{2}(\.\d+)?)?)(?P<tz>Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .unwrap()
});

static INTERPOLATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

fn try_datetime(text: &str) -> Option<ConfigDateTime> {
    let caps = ISO_DATETIME_RE.captures(text)?;
    let date = caps.name("date")?.as_str();
    let time = caps.name("time").map(|m| m.as_str()).unwrap_or("00:00:00");
    let time = if time.matches(':').count() == 1 {
        format!("{}:00", time)
    } else {
        time.to_string()
    };
    if let Some(tz) = caps.name("tz") {
        let tz = tz.as_str();
        let normalized_tz = if tz == "Z" { "+00:00".to_string() } else { normalize_offset(tz) };
        let full = format!("{}T{}{}", date, time, normalized_tz);
        chrono::DateTime::parse_from_rfc3339(&full)
            .ok()
            .map(ConfigDateTime::Fixed)
    } else {
        let full = format!("{}T{}", date, time);
        chrono::NaiveDateTime::parse_from_str(&full, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(ConfigDateTime::Naive)
    }
}

fn normalize_offset(tz: &str) -> String {
    if tz.len() == 5 && !tz.contains(':') {
        format!("{}:{}", &tz[..3], &tz[3..])
    } else {
        tz.to_string()
    }
}

fn convert_env_var(config: &Config, caps: &regex::Captures, loc: Location) -> Result<Value, CfgError> {
    let name = &caps["name"];
    let has_default = caps.name("default").is_some();
    match std::env::var(name) {
        Ok(v) => Ok(Value::String(v)),
        Err(_) if has_default => Ok(Value::String(caps["default"].to_string())),
        Err(_) if config.options().strict_conversions => Err(CfgError::config_at(
            format!("unable to convert string: ${}", name),
            loc,
        )),
        Err(_) => Ok(Value::Null),
    }
}

/// Walk `caps["path"]` (a dotted identifier chain) through the injected
/// host `context`. A missing attribute at any step returns the original
/// backtick text unchanged rather than an error or `Null` — unlike
/// every other special-value rule, this one has no strict-mode failure
/// path.
fn convert_object_path(config: &Config, caps: &regex::Captures, text: &str) -> Result<Value, CfgError> {
    let path = &caps["path"];
    let context = &config.options().context;
    let mut current = None;
    for (i, segment) in path.split('.').enumerate() {
        current = Some(if i == 0 {
            context.get(segment).cloned()
        } else {
            match current.flatten() {
                Some(Value::Mapping(m)) => m.get(segment).cloned(),
                _ => None,
            }
        });
    }
    match current.flatten() {
        Some(v) => Ok(v),
        None => Ok(Value::String(text.to_string())),
    }
}

fn interpolate(config: &Config, text: &str, loc: Location) -> Result<Value, CfgError> {
    let mut out = String::new();
    let mut last = 0;
    for caps in INTERPOLATION_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        out.push_str(&text[last..whole.start()]);
        let path = caps.get(1).unwrap().as_str();
        let value = config.get(path, None).map_err(|e| match e {
            CfgError::Config { message, .. } => CfgError::config_at(message, loc),
            other => other,
        })?;
        out.push_str(&value.string_for());
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Options};

    fn cfg(src: &str) -> Config {
        Config::new(src, Options::default()).unwrap()
    }

    #[test]
    fn plain_text_is_unchanged() {
        let c = cfg("a: 1\n");
        assert_eq!(convert(&c, "hello", Location::start()).unwrap(), Value::String("hello".to_string()));
    }

    #[test]
    fn datetime_without_offset_is_naive() {
        let c = cfg("a: 1\n");
        let v = convert(&c, "2024-01-02 03:04:05", Location::start()).unwrap();
        assert!(matches!(v, Value::DateTime(ConfigDateTime::Naive(_))));
    }

    #[test]
    fn datetime_with_offset_is_fixed() {
        let c = cfg("a: 1\n");
        let v = convert(&c, "2024-01-02T03:04:05+05:30", Location::start()).unwrap();
        assert!(matches!(v, Value::DateTime(ConfigDateTime::Fixed(_))));
    }

    #[test]
    fn env_var_with_default_falls_back_when_unset() {
        std::env::remove_var("CFG_RS_TEST_VAR_DOES_NOT_EXIST");
        let c = cfg("a: 1\n");
        let v = convert(&c, "$CFG_RS_TEST_VAR_DOES_NOT_EXIST|fallback", Location::start()).unwrap();
        assert_eq!(v, Value::String("fallback".to_string()));
    }

    #[test]
    fn env_var_without_default_or_value_is_null_unless_strict() {
        std::env::remove_var("CFG_RS_TEST_VAR_DOES_NOT_EXIST_2");
        let options = Options {
            strict_conversions: false,
            ..Options::default()
        };
        let c = Config::new("a: 1\n", options).unwrap();
        let v = convert(&c, "$CFG_RS_TEST_VAR_DOES_NOT_EXIST_2", Location::start()).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn interpolation_substitutes_referenced_value() {
        let c = cfg("name: 'world'\n");
        let v = convert(&c, "hello, ${name}!", Location::start()).unwrap();
        assert_eq!(v, Value::String("hello, world!".to_string()));
    }
}
