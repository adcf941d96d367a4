//! # Reshape
//!
//! Reshape is a rule driven object transformer. It turns loosely typed input, such as query
//! parameters, into strongly shaped objects, such as database filter or update structures, using
//! a declarative map of per-key rules instead of hand written mapping code.
//!
//! Input keys without a rule are copied through unchanged unless `omitRulelessKeys` is set. Rules
//! fire only when their key path resolves to a value in the input.
//!
//! ```rust
//! use reshape::prelude::*;
//! use reshape::parsers::{to_date, to_int};
//! use reshape::errors::Result;
//! use serde_json::json;
//!
//! fn test_example() -> Result<()> {
//!     let trans = TransformerBuilder::default()
//!         .copy("user.age", copy().destination_key("where.age").parser(to_int))?
//!         .copy("date.from", copy().destination_key("where.date.gte").parser(to_date))?
//!         .copy("date.to", copy().destination_key("where.date.lte").parser(to_date))?
//!         .build()?;
//!     let input = r#"
//!         {
//!             "user": {"age": "33"},
//!             "date": {"from": "2020-12-25", "to": "2021-12-25"}
//!         }"#;
//!     let expected = json!({
//!         "where": {
//!             "age": 33,
//!             "date": {
//!                 "gte": "2020-12-25T00:00:00.000Z",
//!                 "lte": "2021-12-25T00:00:00.000Z"
//!             }
//!         }
//!     });
//!     assert_eq!(expected, trans.apply_from_str(input)?);
//!     Ok(())
//! }
//! # test_example().unwrap();
//! ```
//!
//! custom rules and hooks are plain closures, the scratch record carries values between them
//!
//! ```rust
//! use reshape::prelude::*;
//! use reshape::errors::Result;
//! use serde_json::{json, Value};
//!
//! fn test_hooks() -> Result<()> {
//!     let trans = TransformerBuilder::default()
//!         .options(Options { omit_ruleless_keys: true, ..Options::default() })
//!         .add("first", |ctx: &mut Context<'_>| -> Result<()> {
//!             let value = ctx.value.clone();
//!             ctx.output.scratch_mut().insert("first".to_string(), value);
//!             Ok(())
//!         })?
//!         .on_finish(|ctx: &mut HookContext<'_>| -> Result<()> {
//!             let first = ctx.output.scratch().and_then(|s| s.get("first")).cloned();
//!             ctx.output.insert("name".to_string(), first.unwrap_or(Value::Null));
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     let res = trans.apply(&json!({"first": "Benjamin", "ignored": true}))?;
//!     assert_eq!(res, json!({"name": "Benjamin"}));
//!     Ok(())
//! }
//! # test_hooks().unwrap();
//! ```
//!
pub mod errors;
pub mod merge;
pub mod namespace;
pub mod options;
pub mod output;
pub mod parsers;
pub mod rules;
pub mod transformer;

pub mod prelude {
    pub use crate::merge::Conflict;
    pub use crate::options::{Options, PartialOptions};
    pub use crate::rules::{copy, Context, HookContext, Mapping};
    pub use crate::transformer::{Transformer, TransformerBuilder};
}
