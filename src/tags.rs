//! Tag sets attached to every gauge a binder registers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// A single key/value tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Tag {
    type Err = MetricsError;

    /// Parse `key=value`. The key must be non-empty; the value may be empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Tag::new(key.trim(), value.trim())),
            _ => Err(MetricsError::InvalidTag(s.to_string())),
        }
    }
}

/// An immutable-once-built set of tags.
///
/// Keys are unique (a later value for the same key replaces the earlier one)
/// and insertion order is irrelevant: two sets with the same pairs are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags {
    #[serde(deserialize_with = "deserialize_tag_map")]
    tags: BTreeMap<String, String>,
}

/// A tag value read from any scalar. Config sources such as env vars and
/// YAML type `shard=1` as a number, but tags are always strings.
struct TagValue(String);

impl<'de> Deserialize<'de> for TagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagValueVisitor;

        impl Visitor<'_> for TagValueVisitor {
            type Value = TagValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number, or boolean tag value")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<TagValue, E> {
                Ok(TagValue(v))
            }

            fn visit_char<E: de::Error>(self, v: char) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<TagValue, E> {
                Ok(TagValue(v.to_string()))
            }
        }

        deserializer.deserialize_any(TagValueVisitor)
    }
}

/// Deserialize a tag map whose values may be any scalar, stringifying them.
pub(crate) fn deserialize_tag_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, TagValue>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, TagValue(v))| (k, v)).collect())
}

impl Tags {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set holding a single tag.
    pub fn of(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::empty().and(key, value)
    }

    /// Return a new set with the tag added.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Return a new set with every tag from `other` added.
    pub fn and_tags(mut self, other: &Tags) -> Self {
        self.tags
            .extend(other.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(|t| (t.key, t.value)).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tags: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(tags: BTreeMap<String, String>) -> Self {
        Self { tags }
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        f.write_str("]")
    }
}
