// ABOUTME: Task specification model (ECS task definition shape).
// ABOUTME: Non-empty container list; unmodelled container fields pass through verbatim.

use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::id::TaskSpecId;
use super::image_ref::{ImageReference, ParseImageRefError};

/// The registrable content of a task specification.
///
/// Only fields the orchestrator accepts on registration are modelled here;
/// read-only fields such as revision and status live on [`RegisteredTaskSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpecification {
    pub family: String,

    /// Containers in declaration order. Index 0 is the primary container.
    #[serde(
        serialize_with = "serialize_containers",
        deserialize_with = "deserialize_containers"
    )]
    pub container_definitions: NonEmpty<ContainerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
}

impl TaskSpecification {
    pub fn primary(&self) -> &ContainerSpec {
        self.container_definitions.first()
    }

    pub fn containers(&self) -> impl Iterator<Item = &ContainerSpec> {
        self.container_definitions.iter()
    }
}

/// One container of a task specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,

    /// Raw image string. Only the primary container's image must follow the
    /// `<repository>:<tag>` grammar; sidecars are passed through as-is.
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essential: Option<bool>,

    /// Port mappings, log configuration, secrets and every other field.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContainerSpec {
    pub fn image_reference(&self) -> Result<ImageReference, ParseImageRefError> {
        ImageReference::parse(&self.image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A task specification as the orchestrator stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredTaskSpec {
    #[serde(rename = "taskDefinitionArn")]
    pub id: TaskSpecId,

    #[serde(default)]
    pub revision: u32,

    #[serde(flatten)]
    pub spec: TaskSpecification,
}

fn serialize_containers<S>(containers: &NonEmpty<ContainerSpec>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(containers.iter())
}

fn deserialize_containers<'de, D>(deserializer: D) -> Result<NonEmpty<ContainerSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let containers: Vec<ContainerSpec> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(containers)
        .ok_or_else(|| serde::de::Error::custom("task specification has no containers"))
}
