use crate::errors::{describe, Error, Result};
use crate::namespace::Namespace;
use crate::options::Options;
use crate::output::Output;
use crate::rules::{Context, CopyRule, Hook, HookContext, Mapping, Rule, RuleEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, trace};

/// reserved key of the hook that runs before any rule.
pub const ON_START: &str = "_onStart";

/// reserved key of the hook that runs after every rule.
pub const ON_FINISH: &str = "_onFinish";

fn noop(_: &mut HookContext<'_>) -> Result<()> {
    Ok(())
}

/// TransformerBuilder is used to construct a new Transformer. Once a Transformer is built it is
/// immutable.
///
/// Rules run in the order they were added. Adding a rule for a key path that already has one
/// replaces it without changing its position.
pub struct TransformerBuilder {
    rules: Vec<(String, RuleEntry)>,
    on_start: Box<dyn Hook>,
    on_finish: Box<dyn Hook>,
    options: Options,
}

impl Default for TransformerBuilder {
    fn default() -> Self {
        TransformerBuilder {
            rules: Vec::new(),
            on_start: Box::new(noop),
            on_finish: Box::new(noop),
            options: Options::default(),
        }
    }
}

impl TransformerBuilder {
    /// sets the options handed to every rule and hook.
    #[inline]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// add allows any custom rule to be registered against a key path.
    #[inline]
    pub fn add<S, R>(self, key: S, rule: R) -> Result<Self>
    where
        S: Into<String>,
        R: Rule + 'static,
    {
        self.add_entry(key.into(), RuleEntry::Apply(Box::new(rule)))
    }

    /// adds the built-in copy rule, see `rules::copy`.
    #[inline]
    pub fn copy<S>(self, key: S, rule: CopyRule) -> Result<Self>
    where
        S: Into<String>,
    {
        self.add(key, rule)
    }

    /// marks a key path to be skipped, its value is neither copied through nor processed.
    #[inline]
    pub fn skip<S>(self, key: S) -> Result<Self>
    where
        S: Into<String>,
    {
        self.add_entry(key.into(), RuleEntry::Skip)
    }

    /// sets the `_onStart` hook.
    #[inline]
    pub fn on_start<H>(mut self, hook: H) -> Self
    where
        H: Hook + 'static,
    {
        self.on_start = Box::new(hook);
        self
    }

    /// sets the `_onFinish` hook, it still has access to the scratch record.
    #[inline]
    pub fn on_finish<H>(mut self, hook: H) -> Self
    where
        H: Hook + 'static,
    {
        self.on_finish = Box::new(hook);
        self
    }

    /// adds a single mapping that may have been saved outside of this library.
    #[inline]
    pub fn add_mapping<S>(self, key: S, mapping: Mapping) -> Result<Self>
    where
        S: Into<String>,
    {
        self.add_entry(key.into(), mapping.into_entry())
    }

    /// adds mappings that may have been saved outside of this library for building UI's or other
    /// means of generically building transformations.
    #[inline]
    pub fn add_mappings<S>(mut self, mappings: Vec<(S, Mapping)>) -> Result<Self>
    where
        S: Into<String>,
    {
        for (key, mapping) in mappings {
            self = self.add_mapping(key, mapping)?;
        }
        Ok(self)
    }

    fn add_entry(mut self, key: String, entry: RuleEntry) -> Result<Self> {
        if key == ON_START || key == ON_FINISH {
            return Err(Error::ReservedKey(key));
        }
        match self.rules.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.rules.push((key, entry)),
        }
        Ok(self)
    }

    pub fn build(self) -> Result<Transformer> {
        let options = self.options;
        let rules = self
            .rules
            .into_iter()
            .map(|(key, entry)| -> Result<CompiledRule> {
                let namespace = if options.nests_input() {
                    Namespace::parse(key.as_str(), &options.path_separator)?
                } else {
                    Namespace::flat(key.as_str())?
                };
                Ok(CompiledRule {
                    key,
                    namespace,
                    entry,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(rules = rules.len(), "built transformer");
        Ok(Transformer {
            rules,
            on_start: self.on_start,
            on_finish: self.on_finish,
            options,
        })
    }
}

struct CompiledRule {
    key: String,
    namespace: Namespace,
    entry: RuleEntry,
}

/// Transformer is used to apply the transformation that's been built to any record.
///
/// Each application is a single synchronous pass that builds a fresh output; the transformer
/// itself holds no per-call state and can be shared.
pub struct Transformer {
    rules: Vec<CompiledRule>,
    on_start: Box<dyn Hook>,
    on_finish: Box<dyn Hook>,
    options: Options,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| (&r.key, &r.entry))
                    .collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl Transformer {
    /// builds a transformer from loosely typed configuration, eg. loaded from a file.
    ///
    /// `rules` maps key paths to serialized `Mapping`s, a `null` mapping skips the key. Both
    /// `rules` and `options` may be `null`, anything else that is not a record is rejected.
    pub fn from_json(rules: &Value, options: &Value) -> Result<Self> {
        let rules = match rules {
            Value::Null => Cow::Owned(Map::new()),
            Value::Object(m) => Cow::Borrowed(m),
            v => return Err(Error::InvalidRules(describe(v))),
        };
        let mut builder = TransformerBuilder::default().options(Options::from_value(options)?);
        for (key, value) in rules.iter() {
            let mapping = match value {
                Value::Null => Mapping::Skip,
                v => serde_json::from_value(v.clone())?,
            };
            builder = builder.add_mapping(key.as_str(), mapping)?;
        }
        builder.build()
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// applies the transformation to a record.
    #[inline]
    pub fn apply(&self, input: &Value) -> Result<Value> {
        match input {
            Value::Object(m) => Ok(Value::Object(self.transform(m)?)),
            v => Err(Error::InvalidInput(describe(v))),
        }
    }

    /// applies the transformation to JSON within a string
    #[inline]
    pub fn apply_from_str<'a, S>(&self, input: S) -> Result<Value>
    where
        S: Into<Cow<'a, str>>,
    {
        self.apply(&serde_json::from_str(&input.into())?)
    }

    /// applies the transformation to any serializable data and returns your desired structure.
    #[inline]
    pub fn apply_to<S, D>(&self, input: S) -> Result<D>
    where
        S: Serialize,
        D: DeserializeOwned,
    {
        let results = self.apply(&serde_json::to_value(input)?)?;
        Ok(serde_json::from_value::<D>(results)?)
    }

    fn transform(&self, input: &Map<String, Value>) -> Result<Map<String, Value>> {
        let options = &self.options;
        let mut output = Output::new();
        debug!(keys = input.len(), "starting transformation");

        self.on_start.run(&mut HookContext {
            input,
            output: &mut output,
            options,
        })?;

        // ruleless values are copied through, ruled paths are stripped before any rule writes
        if !options.omit_ruleless_keys {
            let mut passthrough = Map::new();
            for (k, v) in input {
                if !output.contains_key(k) {
                    passthrough.insert(k.clone(), v.clone());
                }
            }
            for rule in &self.rules {
                if rule.namespace.remove(&mut passthrough).is_some() {
                    trace!(key = %rule.key, "removed passthrough value");
                }
            }
            output.extend(passthrough);
        }

        for rule in &self.rules {
            let value = match rule.namespace.read(input) {
                Some(v) => v,
                None => continue,
            };
            match &rule.entry {
                RuleEntry::Skip => {
                    trace!(key = %rule.key, "skipped");
                }
                RuleEntry::Apply(r) => {
                    trace!(key = %rule.key, "applying rule");
                    r.apply(&mut Context {
                        input,
                        output: &mut output,
                        key: &rule.key,
                        value,
                        options,
                    })?;
                }
            }
        }

        self.on_finish.run(&mut HookContext {
            input,
            output: &mut output,
            options,
        })?;
        debug!("finished transformation");
        Ok(output.finish())
    }
}
