use crate::errors::{describe, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Options are handed to every rule and hook. Built once from the defaults overridden by
/// whatever the user supplies, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// drop input keys that have no rule instead of copying them through.
    pub omit_ruleless_keys: bool,
    /// advisory, consulted by `copy` to skip zero length strings.
    pub omit_empty_strings: bool,
    /// delimiter for nested key paths. Empty disables nesting.
    pub path_separator: String,
    pub nested_input_keys: bool,
    pub nested_output_keys: bool,
    /// user defined options, passed along untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            omit_ruleless_keys: false,
            omit_empty_strings: false,
            path_separator: String::from("."),
            nested_input_keys: true,
            nested_output_keys: true,
            extra: Map::new(),
        }
    }
}

impl Options {
    /// builds options from a loosely typed value. `null` yields the defaults, anything that is not
    /// a record is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Options::default()),
            Value::Object(_) => Ok(serde_json::from_value(value.clone())?),
            v => Err(Error::InvalidOptions(describe(v))),
        }
    }

    /// returns these options overridden by a rule's own partial options. Borrows when there is
    /// nothing to override.
    pub fn with<'a>(&'a self, overrides: &PartialOptions) -> Cow<'a, Options> {
        if overrides.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut opts = self.clone();
        if let Some(v) = overrides.omit_ruleless_keys {
            opts.omit_ruleless_keys = v;
        }
        if let Some(v) = overrides.omit_empty_strings {
            opts.omit_empty_strings = v;
        }
        if let Some(v) = &overrides.path_separator {
            opts.path_separator = v.clone();
        }
        if let Some(v) = overrides.nested_input_keys {
            opts.nested_input_keys = v;
        }
        if let Some(v) = overrides.nested_output_keys {
            opts.nested_output_keys = v;
        }
        for (k, v) in &overrides.extra {
            opts.extra.insert(k.clone(), v.clone());
        }
        Cow::Owned(opts)
    }

    /// whether output paths should be split into nested records.
    #[inline]
    pub(crate) fn nests_output(&self) -> bool {
        self.nested_output_keys && !self.path_separator.is_empty()
    }

    #[inline]
    pub(crate) fn nests_input(&self) -> bool {
        self.nested_input_keys && !self.path_separator.is_empty()
    }
}

/// PartialOptions overrides the transformer's options for a single rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_ruleless_keys: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_empty_strings: Option<bool>,
    /// an explicit `null` in serialized form counts as the empty separator.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable_separator"
    )]
    pub path_separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_input_keys: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_output_keys: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn nullable_separator<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::<String>::deserialize(deserializer)?.unwrap_or_default()))
}

impl PartialOptions {
    pub fn is_empty(&self) -> bool {
        self.omit_ruleless_keys.is_none()
            && self.omit_empty_strings.is_none()
            && self.path_separator.is_none()
            && self.nested_input_keys.is_none()
            && self.nested_output_keys.is_none()
            && self.extra.is_empty()
    }

    pub fn omit_empty_strings(mut self, omit: bool) -> Self {
        self.omit_empty_strings = Some(omit);
        self
    }

    pub fn path_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.path_separator = Some(separator.into());
        self
    }

    /// forces flat writes for the rule regardless of the transformer's separator.
    pub fn flat(self) -> Self {
        self.path_separator("")
    }

    pub fn nested_output_keys(mut self, nested: bool) -> Self {
        self.nested_output_keys = Some(nested);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() -> Result<()> {
        let opts = Options::from_value(&Value::Null)?;
        assert_eq!(opts, Options::default());
        assert_eq!(opts.path_separator, ".");
        assert!(opts.nested_input_keys && opts.nested_output_keys);
        assert!(!opts.omit_ruleless_keys && !opts.omit_empty_strings);

        let opts = Options::from_value(&json!({}))?;
        assert_eq!(opts, Options::default());
        Ok(())
    }

    #[test]
    fn test_overrides_and_extra() -> Result<()> {
        let opts = Options::from_value(&json!({
            "omitRulelessKeys": true,
            "pathSeparator": "/",
            "multiplier": 2
        }))?;
        assert!(opts.omit_ruleless_keys);
        assert_eq!(opts.path_separator, "/");
        assert!(opts.nested_output_keys);
        assert_eq!(opts.extra.get("multiplier"), Some(&json!(2)));
        Ok(())
    }

    #[test]
    fn test_invalid_shapes() {
        for (value, expected) in vec![
            (json!("invalid options parameter"), "a string"),
            (json!(1997), "a number"),
            (json!(["an", "array"]), "an array"),
        ] {
            let err = Options::from_value(&value).unwrap_err();
            assert_eq!(
                format!("options parameter is not an object, but {}", expected),
                err.to_string()
            );
        }
    }

    #[test]
    fn test_with() {
        let opts = Options::default();
        match opts.with(&PartialOptions::default()) {
            Cow::Borrowed(_) => {}
            Cow::Owned(_) => panic!("nothing to override, should borrow"),
        }

        let effective = opts.with(&PartialOptions::default().omit_empty_strings(true).flat());
        assert!(effective.omit_empty_strings);
        assert_eq!(effective.path_separator, "");
        assert!(!effective.nests_output());
        // untouched fields are inherited
        assert!(effective.nested_input_keys);
    }

    #[test]
    fn test_partial_null_separator() -> Result<()> {
        let partial: PartialOptions = serde_json::from_value(json!({"pathSeparator": null}))?;
        assert_eq!(partial.path_separator, Some(String::new()));

        let partial: PartialOptions = serde_json::from_value(json!({"omitEmptyStrings": true}))?;
        assert_eq!(partial.path_separator, None);
        assert_eq!(partial.omit_empty_strings, Some(true));
        Ok(())
    }
}
