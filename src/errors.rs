use failure::Fail;
use serde_json::Value;
use std::num::{ParseFloatError, ParseIntError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Fail)]
pub enum Error {
    /// the rules passed to the transformer were not a record.
    #[fail(display = "rules parameter is not an object, but {}", _0)]
    InvalidRules(&'static str),

    /// the options passed to the transformer were not a record.
    #[fail(display = "options parameter is not an object, but {}", _0)]
    InvalidOptions(&'static str),

    /// the value handed to a transformation was not a record.
    #[fail(display = "input is not an object, but {}", _0)]
    InvalidInput(&'static str),

    #[fail(display = "invalid namespace: {}", _0)]
    InvalidNamespace(String),

    /// `_onStart` and `_onFinish` are hooks and cannot hold per-key rules.
    #[fail(display = "'{}' is a reserved key and cannot be used as a rule path", _0)]
    ReservedKey(String),

    #[fail(display = "unable to parse value: {}", _0)]
    Parse(String),

    #[fail(display = "unable to parse date: {}", _0)]
    Date(#[cause] chrono::ParseError),

    /// free form failure raised from within a user defined rule or hook.
    #[fail(display = "{}", _0)]
    Rule(String),

    #[fail(display = "{}", _0)]
    Json(#[cause] serde_json::Error),
}

impl Error {
    /// convenience for custom rules that need to abort a transformation.
    pub fn rule<S: Into<String>>(msg: S) -> Self {
        Error::Rule(msg.into())
    }
}

/// describes a value's type the way the error messages expect it, article included.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Date(err)
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<ParseFloatError> for Error {
    fn from(err: ParseFloatError) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages() {
        let err = Error::InvalidRules(describe(&json!(["an", "array"])));
        assert_eq!("rules parameter is not an object, but an array", err.to_string());

        let err = Error::InvalidOptions(describe(&json!("invalid")));
        assert_eq!("options parameter is not an object, but a string", err.to_string());

        let err = Error::InvalidInput(describe(&json!(1997)));
        assert_eq!("input is not an object, but a number", err.to_string());
    }
}
