//! Configuration paths (`build.format`, `integrations.0`) used to key violations.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step into the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object field name.
    Key(String),
    /// Array position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => formatter.write_str(key),
            Self::Index(index) => write!(formatter, "{index}"),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(index) => {
                serializer.serialize_u64(u64::try_from(*index).unwrap_or(u64::MAX))
            },
        }
    }
}

/// Ordered sequence of segments from the config root to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfigPath(Vec<PathSegment>);

impl ConfigPath {
    /// The config root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from dotted field names (no indices).
    #[must_use]
    pub fn from_keys(keys: &[&str]) -> Self {
        Self(
            keys.iter()
                .map(|key| PathSegment::Key((*key).to_owned()))
                .collect(),
        )
    }

    /// Path to a child field.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_owned()));
        Self(segments)
    }

    /// Path to an array element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// First field name, if any.
    #[must_use]
    pub fn top_level_key(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            if position > 0 {
                formatter.write_str(".")?;
            }
            write!(formatter, "{segment}")?;
        }
        Ok(())
    }
}
