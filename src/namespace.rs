use crate::errors::{Error, Result};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// represents a key path for traversing JSON records, one segment per nesting level.
///
/// # Example
/// `where.date.gte` would be represented by three segments `where`, `date` and `gte`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// parse takes an ordinary namespaced string eg. `object.nested.field` and splits it on the
    /// separator into a usable namespace for reading and writing records.
    ///
    /// An empty separator disables nesting, the whole path becomes a single segment.
    pub fn parse<'a, S>(input: S, separator: &str) -> Result<Namespace>
    where
        S: Into<Cow<'a, str>>,
    {
        let input = input.into();
        if input.is_empty() {
            return Err(Error::InvalidNamespace(String::from(
                "No field defined for namespace",
            )));
        }
        if separator.is_empty() {
            return Ok(Namespace {
                segments: vec![input.into_owned()],
            });
        }
        Ok(Namespace {
            segments: input.split(separator).map(String::from).collect(),
        })
    }

    /// creates a namespace that addresses a single literal key on the top level of a record,
    /// separators included.
    pub fn flat<'a, S>(input: S) -> Result<Namespace>
    where
        S: Into<Cow<'a, str>>,
    {
        Namespace::parse(input, "")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// the first segment; for a flat namespace this is the whole key.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// walks the record one segment at a time. Missing segments, or segments that land on a
    /// non-record value, yield `None`.
    pub fn read<'v>(&self, record: &'v Map<String, Value>) -> Option<&'v Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for id in parents {
            current = current.get(id)?.as_object()?;
        }
        current.get(last)
    }

    /// builds the chain of single key records ending in `value`, returning the root segment and
    /// the value that belongs under it. Merging the fragment into the output is up to the caller.
    pub fn fragment(&self, value: Value) -> (String, Value) {
        let inner = self.segments[1..].iter().rev().fold(value, |acc, id| {
            let mut m = Map::new();
            m.insert(id.clone(), acc);
            Value::Object(m)
        });
        (self.root().to_owned(), inner)
    }

    /// removes whatever lives at this path, pruning records left empty by the removal. Returns
    /// the removed value.
    pub fn remove(&self, record: &mut Map<String, Value>) -> Option<Value> {
        remove_recursive(&self.segments, record)
    }
}

fn remove_recursive(segments: &[String], record: &mut Map<String, Value>) -> Option<Value> {
    let (id, rest) = segments.split_first()?;
    if rest.is_empty() {
        return record.remove(id);
    }
    let child = record.get_mut(id)?.as_object_mut()?;
    let removed = remove_recursive(rest, child)?;
    if child.is_empty() {
        record.remove(id);
    }
    Some(removed)
}

/// flatten turns nested records into a single level record whose keys are the joined
/// namespaces of each leaf. Arrays, scalars and empty records are leaves.
pub fn flatten(record: &Map<String, Value>, separator: &str) -> Map<String, Value> {
    let mut to = Map::new();
    flatten_recursive(separator, "", record, &mut to);
    to
}

#[inline]
fn flatten_recursive(sep: &str, id: &str, from: &Map<String, Value>, to: &mut Map<String, Value>) {
    for (k, v) in from {
        let key = match id.len() {
            0 => k.clone(),
            _ => id.to_owned() + sep + k,
        };
        match v {
            Value::Object(m) if !m.is_empty() => flatten_recursive(sep, &key, m, to),
            _ => {
                to.insert(key, v.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_namespace() -> Result<()> {
        let ns = Namespace::parse("where.date.gte", ".")?;
        assert_eq!(ns.segments(), &["where", "date", "gte"]);
        assert_eq!(ns.root(), "where");

        let ns = Namespace::parse("where/date", "/")?;
        assert_eq!(ns.segments(), &["where", "date"]);
        Ok(())
    }

    #[test]
    fn test_flat() -> Result<()> {
        let ns = Namespace::flat("my.flat.key")?;
        assert_eq!(ns.segments(), &["my.flat.key"]);

        let ns = Namespace::parse("my.flat.key", "")?;
        assert_eq!(ns.root(), "my.flat.key");
        Ok(())
    }

    #[test]
    fn test_blank() {
        assert!(Namespace::parse("", ".").is_err());
        assert!(Namespace::flat("").is_err());
    }

    #[test]
    fn test_read() -> Result<()> {
        let input = json!({
            "user": {"age": "33", "tags": ["a"]},
            "my.flat.key": "v"
        });
        let record = input.as_object().unwrap();

        let ns = Namespace::parse("user.age", ".")?;
        assert_eq!(ns.read(record), Some(&json!("33")));

        let ns = Namespace::parse("user.missing", ".")?;
        assert_eq!(ns.read(record), None);

        // arrays are not traversable records
        let ns = Namespace::parse("user.tags.0", ".")?;
        assert_eq!(ns.read(record), None);

        let ns = Namespace::parse("user.age.deeper", ".")?;
        assert_eq!(ns.read(record), None);

        let ns = Namespace::flat("my.flat.key")?;
        assert_eq!(ns.read(record), Some(&json!("v")));
        Ok(())
    }

    #[test]
    fn test_fragment() -> Result<()> {
        let (root, value) = Namespace::parse("x.y.z", ".")?.fragment(json!(1));
        assert_eq!(root, "x");
        assert_eq!(value, json!({"y": {"z": 1}}));

        let (root, value) = Namespace::flat("x.y.z")?.fragment(json!(1));
        assert_eq!(root, "x.y.z");
        assert_eq!(value, json!(1));
        Ok(())
    }

    #[test]
    fn test_remove_prunes_empty_parents() -> Result<()> {
        let mut input = json!({
            "user": {"age": "33", "name": "Jim"},
            "date": {"from": "2020-12-25"}
        });
        let record = input.as_object_mut().unwrap();

        let removed = Namespace::parse("user.age", ".")?.remove(record);
        assert_eq!(removed, Some(json!("33")));
        let removed = Namespace::parse("date.from", ".")?.remove(record);
        assert_eq!(removed, Some(json!("2020-12-25")));
        assert_eq!(Namespace::parse("date.to", ".")?.remove(record), None);

        assert_eq!(input, json!({"user": {"name": "Jim"}}));
        Ok(())
    }

    #[test]
    fn test_flatten() {
        let input = json!({
            "where": {"age": 33, "date": {"gte": "a", "lte": "b"}},
            "list": [1, 2],
            "empty": {}
        });
        let flat = flatten(input.as_object().unwrap(), "_");
        assert_eq!(
            Value::Object(flat),
            json!({
                "where_age": 33,
                "where_date_gte": "a",
                "where_date_lte": "b",
                "list": [1, 2],
                "empty": {}
            })
        );
    }

    proptest! {
        #[test]
        fn fragment_then_read(segments in prop::collection::vec("[a-z]{1,6}", 1..5), leaf in any::<i64>()) {
            let path = segments.join(".");
            let ns = Namespace::parse(path.as_str(), ".").unwrap();
            let (root, value) = ns.fragment(Value::from(leaf));
            let mut record = Map::new();
            record.insert(root, value);
            prop_assert_eq!(ns.read(&record), Some(&Value::from(leaf)));
            let flat = flatten(&record, ".");
            prop_assert_eq!(flat.get(&path), Some(&Value::from(leaf)));
        }
    }
}
