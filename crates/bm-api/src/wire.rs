//! JSON:API documents returned by the BattleMetrics API.
//!
//! Optional nested fields are resolved here, once, into plain domain types.

use bm_core::{OnlinePlayer, Session};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::ApiError;

/// One page of the `/sessions` feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPage {
    /// Sessions in feed order (newest first).
    pub sessions: Vec<Session>,
    /// Absolute URL of the following page, if any.
    pub next: Option<String>,
}

/// A server returned by a name search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSummary {
    pub id: u64,
    pub name: String,
    pub status: String,
}

impl ServerSummary {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    data: Vec<SessionResource>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct SessionResource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: SessionAttributes,
    #[serde(default)]
    relationships: SessionRelationships,
}

#[derive(Debug, Default, Deserialize)]
struct SessionAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    stop: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionRelationships {
    #[serde(default)]
    player: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(default)]
    data: Option<ResourceIdentifier>,
}

#[derive(Debug, Deserialize)]
struct ResourceIdentifier {
    id: String,
}

/// Decodes one `/sessions` response body.
///
/// A missing or malformed start time fails the whole page: the sweep cannot
/// place an undated session.
pub fn parse_session_page(body: &str) -> Result<SessionPage, ApiError> {
    let document: SessionDocument =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;

    let sessions = document
        .data
        .into_iter()
        .map(into_session)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SessionPage {
        sessions,
        next: document.links.next.filter(|next| !next.is_empty()),
    })
}

fn into_session(resource: SessionResource) -> Result<Session, ApiError> {
    let label = resource.id.unwrap_or_else(|| "<unknown>".to_string());
    let attributes = resource.attributes;

    let start = attributes
        .start
        .as_deref()
        .ok_or_else(|| ApiError::InvalidSession {
            id: label.clone(),
            reason: "missing start time".to_string(),
        })
        .and_then(|raw| parse_timestamp(&label, raw))?;
    let stop = attributes
        .stop
        .as_deref()
        .map(|raw| parse_timestamp(&label, raw))
        .transpose()?;

    let player_id = resource
        .relationships
        .player
        .and_then(|player| player.data)
        .map(|data| data.id);

    Session::new(player_id, attributes.name.unwrap_or_default(), start, stop).map_err(|err| {
        ApiError::InvalidSession {
            id: label,
            reason: err.to_string(),
        }
    })
}

fn parse_timestamp(label: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| ApiError::InvalidSession {
            id: label.to_string(),
            reason: format!("invalid timestamp {raw:?}: {err}"),
        })
}

#[derive(Debug, Deserialize)]
struct ServerListDocument {
    #[serde(default)]
    data: Vec<ServerResource>,
}

#[derive(Debug, Deserialize)]
struct ServerResource {
    id: String,
    #[serde(default)]
    attributes: ServerAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct ServerAttributes {
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
}

/// Decodes a `/servers` search response.
pub fn parse_server_list(body: &str) -> Result<Vec<ServerSummary>, ApiError> {
    let document: ServerListDocument =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;

    document
        .data
        .into_iter()
        .map(|server| {
            let id = server.id.parse().map_err(|_| {
                ApiError::InvalidResponse(format!("server id {:?} is not numeric", server.id))
            })?;
            Ok(ServerSummary {
                id,
                name: server.attributes.name,
                status: server.attributes.status,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ServerSnapshotDocument {
    #[serde(default)]
    included: Vec<IncludedResource>,
}

#[derive(Debug, Deserialize)]
struct IncludedResource {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    attributes: PlayerAttributes,
    #[serde(default)]
    meta: PlayerMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerAttributes {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerMeta {
    #[serde(default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    key: String,
    #[serde(default)]
    value: Value,
}

/// Decodes the players of a `/servers/{id}?include=player` response.
pub fn parse_server_players(body: &str) -> Result<Vec<OnlinePlayer>, ApiError> {
    let document: ServerSnapshotDocument =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;

    Ok(document
        .included
        .into_iter()
        .filter(|resource| resource.kind.as_deref().is_none_or(|kind| kind == "player"))
        .map(into_online_player)
        .collect())
}

fn into_online_player(resource: IncludedResource) -> OnlinePlayer {
    let mut player = OnlinePlayer {
        name: resource.attributes.name,
        squad_id: None,
        session_seconds: None,
        score: 0,
    };

    for entry in resource.meta.metadata {
        match entry.key.as_str() {
            "squadID" => player.squad_id = value_to_string(&entry.value),
            "time" => player.session_seconds = entry.value.as_f64(),
            "score" => player.score = value_to_i64(&entry.value).unwrap_or(0),
            _ => {}
        }
    }

    player
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn value_to_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
