//! Raw environment document
//!
//! The persisted shape of a workspace environment as the backend hands it
//! over: a recipe descriptor plus a map of machine name to machine config.
//! Only the fields a translator reads or writes are typed. Everything else
//! stays in a flattened `extra` map, and typed optional fields remember
//! whether the source had the key at all or had an explicit `null`, so
//! decoding and re-encoding a document never changes it.

use crate::recipe::RecipeType;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute key holding a machine's memory limit in bytes
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";

/// An optional JSON field: `None` when the key is absent, `Some(None)`
/// for an explicit `null`
pub type Nullable<T> = Option<Option<T>>;

/// Keep `null` apart from a missing key; pair with `#[serde(default)]`
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// How the `machines` key appeared in the source document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum MachinesKey {
    #[default]
    Present,
    Null,
    Absent,
}

/// A workspace environment as persisted by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEnvironmentRepr", into = "RawEnvironmentRepr")]
pub struct RawEnvironment {
    /// How the environment's runtime is constructed
    pub recipe: RecipeDescriptor,
    /// Machine configs keyed by machine name
    pub machines: BTreeMap<String, RawMachineConfig>,
    pub extra: Map<String, Value>,
    machines_key: MachinesKey,
}

/// Wire form of [`RawEnvironment`]
#[derive(Serialize, Deserialize)]
struct RawEnvironmentRepr {
    recipe: RecipeDescriptor,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    machines: Nullable<BTreeMap<String, RawMachineConfig>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawEnvironmentRepr> for RawEnvironment {
    fn from(repr: RawEnvironmentRepr) -> Self {
        let (machines, machines_key) = match repr.machines {
            None => (BTreeMap::new(), MachinesKey::Absent),
            Some(None) => (BTreeMap::new(), MachinesKey::Null),
            Some(Some(machines)) => (machines, MachinesKey::Present),
        };
        RawEnvironment {
            recipe: repr.recipe,
            machines,
            extra: repr.extra,
            machines_key,
        }
    }
}

impl From<RawEnvironment> for RawEnvironmentRepr {
    fn from(env: RawEnvironment) -> Self {
        // an empty map is written back the way it was read
        let machines = if !env.machines.is_empty() {
            Some(Some(env.machines))
        } else {
            match env.machines_key {
                MachinesKey::Present => Some(Some(env.machines)),
                MachinesKey::Null => Some(None),
                MachinesKey::Absent => None,
            }
        };
        RawEnvironmentRepr {
            recipe: env.recipe,
            machines,
            extra: env.extra,
        }
    }
}

/// Recipe descriptor: type plus format-specific location.
///
/// Inline content (`content`, `contentType`) and any other keys are kept
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDescriptor {
    #[serde(rename = "type")]
    pub recipe_type: RecipeType,
    /// Image reference, dockerfile URL, ... depending on `recipe_type`
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Nullable<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-machine configuration, format-agnostic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMachineConfig {
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub attributes: Nullable<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub agents: Nullable<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub servers: Nullable<BTreeMap<String, ServerConfig>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named network endpoint exposed by a machine.
///
/// Server descriptors are passed through as they are; nothing here
/// interprets `port`, `protocol` or `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerConfig(pub Map<String, Value>);

impl ServerConfig {
    /// `8080`, `"8080/tcp"`, or whatever the backend stored
    pub fn port(&self) -> Option<&Value> {
        self.0.get("port")
    }

    pub fn protocol(&self) -> Option<&str> {
        self.0.get("protocol").and_then(Value::as_str)
    }
}

impl RawEnvironment {
    /// Create an environment with no machines
    pub fn new(recipe: RecipeDescriptor) -> Self {
        RawEnvironment {
            recipe,
            machines: BTreeMap::new(),
            extra: Map::new(),
            machines_key: MachinesKey::Present,
        }
    }

    /// Decode a document from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a document from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode back into a JSON value
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Machine names, sorted
    pub fn machine_names(&self) -> impl Iterator<Item = &str> {
        self.machines.keys().map(String::as_str)
    }
}

impl RecipeDescriptor {
    /// Descriptor pointing at a location, e.g. an image reference
    pub fn with_location(recipe_type: RecipeType, location: impl Into<String>) -> Self {
        RecipeDescriptor {
            recipe_type,
            location: Some(Some(location.into())),
            extra: Map::new(),
        }
    }

    /// Location, if set to a non-null value
    pub fn location(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.as_deref())
    }

    /// Inline recipe body (dockerfile text, compose yaml)
    pub fn content(&self) -> Option<&str> {
        self.extra.get("content").and_then(Value::as_str)
    }
}

impl RawMachineConfig {
    /// The config a rebuild creates for a machine the document lacks
    pub fn with_empty_attributes() -> Self {
        RawMachineConfig {
            attributes: Some(Some(Map::new())),
            ..Default::default()
        }
    }
}
