// ABOUTME: Phantom-typed orchestrator identifiers for compile-time type safety.
// ABOUTME: Prevents accidental swapping of task, task spec, cluster, and service ARNs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum TaskMarker {}
pub enum TaskSpecMarker {}
pub enum ClusterMarker {}
pub enum ServiceMarker {}

/// An orchestrator-assigned identifier (usually an ARN) tagged with the kind
/// of resource it names.
///
/// A task ARN and a task specification ARN are both strings on the wire, but
/// comparing one against the other is always a bug:
///
/// ```compile_fail
/// use sortie::types::{TaskId, TaskSpecId};
///
/// fn wants_spec(_id: &TaskSpecId) {}
///
/// let task = TaskId::new("arn:aws:ecs:us-east-1:1:task/prod/abc".to_string());
/// wants_spec(&task);
/// ```
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: String) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    /// The last path segment of an ARN (`.../prod/web` -> `web`), or the whole
    /// value when it has no `/`.
    pub fn short_name(&self) -> &str {
        self.value
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.value)
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only a marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type TaskId = Id<TaskMarker>;
pub type TaskSpecId = Id<TaskSpecMarker>;
pub type ClusterArn = Id<ClusterMarker>;
pub type ServiceArn = Id<ServiceMarker>;
