//! HTTP side requests to the world service.
//!
//! These calls are independent of the WebSocket session and never touch
//! the mirrored state. They are best-effort: a failure is logged and the
//! caller gets an empty list or `None`.

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use lorekeep_protocol::NodeId;

use crate::{ClientConfig, LorekeepError};

/// Map capture seed used when the caller has no preference.
pub const DEFAULT_CAPTURE_SEED: &str = "antigravity_v1";

/// Challenge rating used for a spawn when the caller has no preference.
pub const DEFAULT_SPAWN_CR: f64 = 0.25;

/// An actor standing at a map node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeActor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location_node_id: Option<NodeId>,
    #[serde(default)]
    pub hp_max: Option<i64>,
    #[serde(default)]
    pub hp_current: Option<i64>,
    #[serde(default)]
    pub ac: Option<i64>,
    #[serde(default)]
    pub cr: Option<f64>,
    /// Profile and anything else the service adds.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    image_url: Option<String>,
}

/// Client for the `/api/world/map` endpoints.
#[derive(Debug, Clone)]
pub struct WorldApi {
    http: reqwest::Client,
    base: Url,
}

impl WorldApi {
    /// A client rooted at `base`, e.g. `http://localhost:8000`. A path on
    /// the base is kept as a prefix for every endpoint.
    ///
    /// # Errors
    /// [`LorekeepError::Url`] if `base` does not parse, or
    /// [`LorekeepError::Config`] if it cannot carry a path.
    pub fn new(base: &str) -> Result<Self, LorekeepError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(LorekeepError::Config(format!(
                "world service base {base} cannot carry a path"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, LorekeepError> {
        Self::new(&config.http_base)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The base URL with `segments` appended, each escaped as exactly one
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, LorekeepError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| LorekeepError::Config(format!("{} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Actors currently at `node`. Empty on any failure.
    pub async fn node_actors(&self, node: &NodeId) -> Vec<NodeActor> {
        match self.try_node_actors(node).await {
            Ok(actors) => actors,
            Err(e) => {
                tracing::warn!(%node, error = %e, "failed to fetch node actors");
                Vec::new()
            }
        }
    }

    /// Spawns a generated NPC of challenge rating `cr` at `node`.
    pub async fn spawn_npc(&self, node: &NodeId, cr: f64) -> Option<NodeActor> {
        match self.try_spawn_npc(node, cr).await {
            Ok(actor) => Some(actor),
            Err(e) => {
                tracing::warn!(%node, cr, error = %e, "failed to spawn npc");
                None
            }
        }
    }

    /// Asks the service to render the map around `node`. Returns the
    /// image URL, relative to the service.
    pub async fn capture_map(&self, node: &NodeId, seed: &str) -> Option<String> {
        match self.try_capture_map(node, seed).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                tracing::warn!(%node, "map capture returned no image url");
                None
            }
            Err(e) => {
                tracing::warn!(%node, error = %e, "failed to capture map");
                None
            }
        }
    }

    async fn try_node_actors(&self, node: &NodeId) -> Result<Vec<NodeActor>, LorekeepError> {
        let url = self.endpoint(&["api", "world", "map", "nodes", node.as_str(), "actors"])?;
        let actors = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(actors)
    }

    async fn try_spawn_npc(&self, node: &NodeId, cr: f64) -> Result<NodeActor, LorekeepError> {
        let url = self.endpoint(&["api", "world", "map", "nodes", node.as_str(), "spawn-npc"])?;
        let actor = self
            .http
            .post(url)
            .query(&[("cr", cr)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(actor)
    }

    async fn try_capture_map(
        &self,
        node: &NodeId,
        seed: &str,
    ) -> Result<Option<String>, LorekeepError> {
        let url = self.endpoint(&["api", "world", "map", "capture", node.as_str()])?;
        let response: CaptureResponse = self
            .http
            .post(url)
            .query(&[("seed", seed)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.image_url)
    }
}
