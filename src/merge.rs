use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ConflictHandler decides what ends up at a leaf when two writes land on the same location and
/// at least one side is not a record.
pub trait ConflictHandler: Send + Sync {
    fn resolve(&self, existing: Value, incoming: Value) -> Value;
}

impl<F> ConflictHandler for F
where
    F: Fn(Value, Value) -> Value + Send + Sync,
{
    #[inline]
    fn resolve(&self, existing: Value, incoming: Value) -> Value {
        self(existing, incoming)
    }
}

/// the built-in conflict policies. `LastWriteWins` is the default for every `copy` rule; the others
/// have to be asked for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Conflict {
    LastWriteWins,
    FirstWriteWins,
    /// collects both sides into an array, appending to the existing value when it already is one.
    Accumulate,
}

impl Default for Conflict {
    fn default() -> Self {
        Conflict::LastWriteWins
    }
}

impl ConflictHandler for Conflict {
    fn resolve(&self, existing: Value, incoming: Value) -> Value {
        match self {
            Conflict::LastWriteWins => incoming,
            Conflict::FirstWriteWins => existing,
            Conflict::Accumulate => match existing {
                Value::Array(mut arr) => {
                    arr.push(incoming);
                    Value::Array(arr)
                }
                v => Value::Array(vec![v, incoming]),
            },
        }
    }
}

/// merge combines the value already present at an output location with an incoming one.
///
/// Records are merged key by key, keys found on only one side pass through untouched. Anything
/// else is a leaf conflict and is handed to `handler`.
pub fn merge(existing: Option<Value>, incoming: Value, handler: &dyn ConflictHandler) -> Value {
    match existing {
        None => incoming,
        Some(existing) => merge_values(existing, incoming, handler),
    }
}

fn merge_values(existing: Value, incoming: Value, handler: &dyn ConflictHandler) -> Value {
    match (existing, incoming) {
        (Value::Object(mut to), Value::Object(from)) => {
            for (k, v) in from {
                let merged = merge(to.remove(&k), v, handler);
                to.insert(k, merged);
            }
            Value::Object(to)
        }
        (existing, incoming) => handler.resolve(existing, incoming),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_write() {
        let res = merge(None, json!({"a": 1}), &Conflict::default());
        assert_eq!(res, json!({"a": 1}));
    }

    #[test]
    fn test_disjoint_records() {
        let res = merge(
            Some(json!({"age": 33, "date": {"gte": "a"}})),
            json!({"date": {"lte": "b"}}),
            &Conflict::default(),
        );
        assert_eq!(res, json!({"age": 33, "date": {"gte": "a", "lte": "b"}}));
    }

    #[test]
    fn test_leaf_conflict() {
        let existing = json!({"where": {"age": "A"}});
        let incoming = json!({"where": {"age": "B"}});

        let res = merge(Some(existing.clone()), incoming.clone(), &Conflict::LastWriteWins);
        assert_eq!(res, json!({"where": {"age": "B"}}));

        let res = merge(Some(existing.clone()), incoming.clone(), &Conflict::FirstWriteWins);
        assert_eq!(res, json!({"where": {"age": "A"}}));

        let keep_existing = |a: Value, _b: Value| a;
        let res = merge(Some(existing), incoming, &keep_existing);
        assert_eq!(res, json!({"where": {"age": "A"}}));
    }

    #[test]
    fn test_mismatched_types_are_leaves() {
        // a record meeting a scalar is not traversed
        let res = merge(Some(json!({"a": 1})), json!("scalar"), &Conflict::default());
        assert_eq!(res, json!("scalar"));

        // arrays are never merged element-wise
        let res = merge(Some(json!([1, 2])), json!([3]), &Conflict::default());
        assert_eq!(res, json!([3]));
    }

    #[test]
    fn test_accumulate() {
        let res = merge(Some(json!({"tag": "a"})), json!({"tag": "b"}), &Conflict::Accumulate);
        let res = merge(Some(res), json!({"tag": "c"}), &Conflict::Accumulate);
        assert_eq!(res, json!({"tag": ["a", "b", "c"]}));
    }

    #[test]
    fn test_conflict_serialization() -> crate::errors::Result<()> {
        assert_eq!(serde_json::to_string(&Conflict::LastWriteWins)?, r#""lastWriteWins""#);
        let c: Conflict = serde_json::from_str(r#""accumulate""#)?;
        assert_eq!(c, Conflict::Accumulate);
        Ok(())
    }
}
