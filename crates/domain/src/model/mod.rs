//! Service records as the registry backend hands them out.
//!
//! Apart from `id` the store never interprets a record, so every other field
//! is carried through untouched as a JSON attribute map.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a service record. The backend decides the shape, so both
/// integer and string ids are accepted and written back the way they came in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceId {
    Number(i64),
    Text(String),
}

impl ServiceId {
    /// Integer when the text is one, string otherwise.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl FromStr for ServiceId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceId::Number(number) => write!(f, "{number}"),
            ServiceId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for ServiceId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Opaque service record. A record without an id (e.g. one about to be
/// created, when the server assigns ids) never matches an id lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ServiceId>,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl Service {
    pub fn new(id: impl Into<ServiceId>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Map::new(),
        }
    }

    pub fn without_id() -> Self {
        Self {
            id: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&ServiceId> {
        self.id.as_ref()
    }

    pub fn has_id(&self, id: &ServiceId) -> bool {
        self.id.as_ref() == Some(id)
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}
