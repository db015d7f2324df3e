//! `${token}` placeholder expansion for configuration property values.

use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Supplies values for `${token}` placeholders in configuration documents.
pub trait PropertyResolver {
    /// Returns the value for `name`, or `None` if it is unknown.
    fn resolve(&self, name: &str) -> Option<String>;
}

/// A [`PropertyResolver`] backed by a fixed map.
#[derive(Clone, Debug, Default)]
pub struct MapPropertyResolver {
    values: BTreeMap<String, String>,
}

impl MapPropertyResolver {
    /// Creates a resolver over the given values.
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Adds or replaces one value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl PropertyResolver for MapPropertyResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl<F> PropertyResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Expands every `${name}` in `value`.
///
/// `$$` is a literal `$`. If any placeholder is unknown, the whole value is
/// replaced by `default` when one is given; otherwise expansion fails with
/// [`ConfigError::UnresolvedProperty`]. An unterminated `${` is a parse error.
pub fn expand_placeholders(
    value: &str,
    resolver: &dyn PropertyResolver,
    default: Option<&str>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if let Some(after) = tail.strip_prefix('$') {
            out.push('$');
            rest = after;
        } else if let Some(body) = tail.strip_prefix('{') {
            let end = body.find('}').ok_or_else(|| {
                ConfigError::Parse(format!("syntax error in property value: {value}"))
            })?;
            let name = &body[..end];
            match resolver.resolve(name) {
                Some(resolved) => out.push_str(&resolved),
                None => {
                    return match default {
                        Some(default) => Ok(default.to_string()),
                        None => Err(ConfigError::UnresolvedProperty(name.to_string())),
                    }
                }
            }
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = tail;
        }
    }
    out.push_str(rest);
    Ok(out)
}
