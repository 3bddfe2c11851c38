//! Persisted document types
//!
//! The adapter stores any type implementing [`Persisted`]. A persisted type
//! exposes the system fields the adapter stamps (`id`, `appid`, `timestamp`,
//! `updated`) and declares its locked fields at compile time through
//! [`Persisted::LOCKED_FIELDS`]. Locked fields are written when a document is
//! created and never overwritten by a later update.
//!
//! [`Document`] is a ready-made persisted type: a handful of system fields
//! plus free-form JSON properties.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A type the adapter can store.
///
/// The serialized form must be a JSON object whose keys match the names
/// listed in `LOCKED_FIELDS`.
pub trait Persisted: Serialize + DeserializeOwned + Send + Sync {
    /// JSON field names that are immutable after creation
    const LOCKED_FIELDS: &'static [&'static str];

    /// Document id, unique within a tenant
    fn id(&self) -> Option<&str>;
    /// Set the document id
    fn set_id(&mut self, id: String);

    /// Owning tenant
    fn appid(&self) -> Option<&str>;
    /// Set the owning tenant
    fn set_appid(&mut self, appid: String);

    /// Creation time, epoch millis
    fn timestamp(&self) -> Option<i64>;
    /// Set the creation time
    fn set_timestamp(&mut self, millis: i64);

    /// Last modification time, epoch millis
    fn updated(&self) -> Option<i64>;
    /// Set the last modification time
    fn set_updated(&mut self, millis: i64);

    /// Id if present and not blank
    fn key(&self) -> Option<&str> {
        self.id().filter(|id| !id.trim().is_empty())
    }
}

/// General-purpose persisted document.
///
/// System fields are typed; everything else lives in `properties` and is
/// flattened into the same JSON object on the wire.
///
/// # Example
///
/// ```rust
/// use colonnade_core::Document;
///
/// let doc = Document::new("post")
///     .with_property("title", "hello")
///     .with_property("votes", 3);
/// assert_eq!(doc.property("votes"), Some(&serde_json::json!(3)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Owning tenant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<String>,
    /// Parent document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parentid: Option<String>,
    /// Id of the creating user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatorid: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation time, epoch millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Last modification time, epoch millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    /// Free-form properties
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Document {
    /// Create an empty document of the given type
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            ..Self::default()
        }
    }

    /// Builder: set the id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set a free-form property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a free-form property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Set a free-form property, returning the previous value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(key.into(), value.into())
    }
}

impl Persisted for Document {
    const LOCKED_FIELDS: &'static [&'static str] =
        &["id", "type", "appid", "parentid", "creatorid", "timestamp"];

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn appid(&self) -> Option<&str> {
        self.appid.as_deref()
    }

    fn set_appid(&mut self, appid: String) {
        self.appid = Some(appid);
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    fn set_timestamp(&mut self, millis: i64) {
        self.timestamp = Some(millis);
    }

    fn updated(&self) -> Option<i64> {
        self.updated
    }

    fn set_updated(&mut self, millis: i64) {
        self.updated = Some(millis);
    }
}
