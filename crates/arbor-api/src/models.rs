// Tree API response types
//
// Wire models for the tree service. Node ids arrive as JSON numbers on
// the reference server and as strings elsewhere; both are normalized to
// strings here so nothing downstream cares. `children` is optional on the
// wire and treated as empty when absent or null.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

// ── Tree ─────────────────────────────────────────────────────────────

/// Decoded `tree.get` payload: the root id plus the root's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeResponse {
    pub id: String,
    pub children: Vec<NodeResponse>,
}

/// A single node as returned by the service, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResponse {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<NodeResponse>,
}

/// Raw `tree.get` payload before the root id is checked.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTreeResponse {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    children: Vec<NodeResponse>,
}

impl TryFrom<RawTreeResponse> for TreeResponse {
    type Error = Error;

    fn try_from(raw: RawTreeResponse) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingRootId)?;
        Ok(Self {
            id,
            children: raw.children,
        })
    }
}

// ── Error body ───────────────────────────────────────────────────────

/// Error payload the reference server sends with non-2xx statuses:
/// `{"type":"Secure","id":42,"data":{"message":"..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<ServiceErrorData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorData {
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceError {
    /// The human-readable message, if the body carried one.
    pub(crate) fn message(self) -> Option<String> {
        self.data
            .and_then(|d| d.message)
            .filter(|m| !m.is_empty())
    }
}

// ── Deserialization helpers ──────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WireId>::deserialize(deserializer)?.map(String::from))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
