use crate::errors::Result;
use crate::merge::{Conflict, ConflictHandler};
use crate::namespace::Namespace;
use crate::options::{Options, PartialOptions};
use crate::output::Output;
use crate::parsers::{NamedParser, Parser};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Context is what a rule gets to work with: the whole input, the output being built, the rule's
/// key path and the value found at it.
pub struct Context<'a> {
    pub input: &'a Map<String, Value>,
    pub output: &'a mut Output,
    pub key: &'a str,
    pub value: &'a Value,
    pub options: &'a Options,
}

/// HookContext is handed to the `_onStart` and `_onFinish` hooks.
pub struct HookContext<'a> {
    pub input: &'a Map<String, Value>,
    pub output: &'a mut Output,
    pub options: &'a Options,
}

/// Rule processes one input value into the output.
pub trait Rule: Send + Sync {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()>;
}

impl<F> Rule for F
where
    F: Fn(&mut Context<'_>) -> Result<()> + Send + Sync,
{
    #[inline]
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        self(ctx)
    }
}

/// Hook runs once per transformation, before or after all rules.
pub trait Hook: Send + Sync {
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()>;
}

impl<F> Hook for F
where
    F: Fn(&mut HookContext<'_>) -> Result<()> + Send + Sync,
{
    #[inline]
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// what is registered against a key path.
pub enum RuleEntry {
    Apply(Box<dyn Rule>),
    /// read the value but neither copy it nor run anything for it.
    Skip,
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleEntry::Apply(_) => f.write_str("Apply(..)"),
            RuleEntry::Skip => f.write_str("Skip"),
        }
    }
}

///
/// Mapping is the serializable form of a rule, for rule sets stored outside of this library.
///
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Mapping {
    Skip,
    #[serde(rename_all = "camelCase")]
    Copy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        destination_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parser: Option<Box<dyn NamedParser>>,
        #[serde(default)]
        conflict: Conflict,
        #[serde(default, skip_serializing_if = "PartialOptions::is_empty")]
        options: PartialOptions,
    },
}

impl Mapping {
    pub(crate) fn into_entry(self) -> RuleEntry {
        match self {
            Mapping::Skip => RuleEntry::Skip,
            Mapping::Copy {
                destination_key,
                parser,
                conflict,
                options,
            } => {
                let mut rule = copy().conflict_handler(conflict).options(options);
                if let Some(key) = destination_key {
                    rule = rule.destination_key(key);
                }
                if let Some(named) = parser {
                    rule = rule.parser(move |v: &Value| NamedParser::parse(named.as_ref(), v));
                }
                RuleEntry::Apply(Box::new(rule))
            }
        }
    }
}

/// creates the built-in `copy` rule, which copies the value to the output, by default under the
/// rule's own key path.
///
/// ```rust
/// use reshape::prelude::*;
/// use reshape::parsers::to_int;
/// use reshape::errors::Result;
/// use serde_json::json;
///
/// fn test_copy() -> Result<()> {
///     let trans = TransformerBuilder::default()
///         .copy("age", copy().destination_key("where.age").parser(to_int))?
///         .build()?;
///     let res = trans.apply(&json!({"age": "33"}))?;
///     assert_eq!(res, json!({"where": {"age": 33}}));
///     Ok(())
/// }
/// # test_copy().unwrap();
/// ```
pub fn copy() -> CopyRule {
    CopyRule::default()
}

/// CopyRule is built by `copy()`.
#[derive(Default)]
pub struct CopyRule {
    parser: Option<Arc<dyn Parser>>,
    destination_key: Option<String>,
    conflict_handler: Option<Arc<dyn ConflictHandler>>,
    options: PartialOptions,
}

impl CopyRule {
    /// runs before the value is written; parser errors abort the transformation.
    pub fn parser<P>(mut self, parser: P) -> Self
    where
        P: Parser + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// the output key path to write to instead of the rule's own key path.
    pub fn destination_key<S: Into<String>>(mut self, key: S) -> Self {
        self.destination_key = Some(key.into());
        self
    }

    /// decides what happens when a nested write lands on an existing leaf. Defaults to
    /// `Conflict::LastWriteWins`.
    pub fn conflict_handler<H>(mut self, handler: H) -> Self
    where
        H: ConflictHandler + 'static,
    {
        self.conflict_handler = Some(Arc::new(handler));
        self
    }

    /// overrides the transformer's options for this rule only.
    pub fn options(mut self, options: PartialOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for CopyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyRule")
            .field("destination_key", &self.destination_key)
            .field("parser", &self.parser.is_some())
            .field("conflict_handler", &self.conflict_handler.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Rule for CopyRule {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let options = ctx.options.with(&self.options);
        if options.omit_empty_strings && ctx.value.as_str() == Some("") {
            return Ok(());
        }

        let parsed = match &self.parser {
            Some(parser) => parser.parse(ctx.value)?,
            None => ctx.value.clone(),
        };
        let destination = self.destination_key.as_deref().unwrap_or(ctx.key);

        if options.nests_output() {
            let namespace = Namespace::parse(destination, &options.path_separator)?;
            match &self.conflict_handler {
                Some(handler) => ctx.output.merge_at(&namespace, parsed, handler.as_ref()),
                None => ctx
                    .output
                    .merge_at(&namespace, parsed, &Conflict::LastWriteWins),
            }
        } else {
            // a flat key can't partially overlap anything, replace outright
            ctx.output.insert(destination.to_string(), parsed);
        }
        Ok(())
    }
}
