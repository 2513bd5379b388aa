use super::store::{entity_id, KvStore, LocalEntityCache, StoreError};
use crate::constants::LOCAL_PLACEHOLDER_FACE;
use crate::str_utils::error_chain;
use crate::types::ParsedBody;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Where a listing came from. The two sources are never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Remote(Vec<Value>),
    Local(Vec<Value>),
}

impl Listing {
    pub fn entities(&self) -> &[Value] {
        match self {
            Listing::Remote(items) | Listing::Local(items) => items,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Listing::Local(_))
    }
}

/// Display-only follower and engagement figures, stable per viewer and entity.
pub fn cosmetic_stats(viewer: &str, id: &str) -> (String, String) {
    let mut hasher = Sha256::new();
    hasher.update(viewer.as_bytes());
    hasher.update([0u8]);
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();

    let followers = u16::from_be_bytes([digest[0], digest[1]]) % 50;
    let engagement = u16::from_be_bytes([digest[2], digest[3]]) % 500;
    (
        format!("{:.1}M", f64::from(followers) / 10.0),
        format!("{:.2}%", f64::from(engagement) / 100.0),
    )
}

pub struct DegradedClient<S: KvStore> {
    http: reqwest::Client,
    base_url: String,
    viewer: String,
    cache: LocalEntityCache<S>,
}

impl<S: KvStore> DegradedClient<S> {
    pub fn new(http: reqwest::Client, base_url: &str, viewer: &str, store: S) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            viewer: viewer.to_string(),
            cache: LocalEntityCache::new(store),
        }
    }

    pub fn cache(&self) -> &LocalEntityCache<S> {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` and returns its JSON body only for a 2xx answer.
    async fn fetch(&self, path: &str) -> Option<Value> {
        let response = match self.http.get(self.url(path)).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("GET {} failed: {}", path, error_chain(&e));
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} answered {}", path, status.as_u16());
            return None;
        }
        match response.json::<Value>().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("GET {} returned unreadable body: {}", path, error_chain(&e));
                None
            }
        }
    }

    fn decorate(&self, mut entity: Value) -> Value {
        let id = entity_id(&entity).unwrap_or_default();
        if let Value::Object(map) = &mut entity {
            let (followers, engagement) = cosmetic_stats(&self.viewer, &id);
            map.entry("followers").or_insert(Value::String(followers));
            map.entry("engagement").or_insert(Value::String(engagement));

            let local_only = map.get("local_only").and_then(Value::as_bool).unwrap_or(false);
            let has_face = map
                .get("face_image_url")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if local_only && !has_face {
                map.insert(
                    "face_image_url".to_string(),
                    Value::String(LOCAL_PLACEHOLDER_FACE.to_string()),
                );
            }
        }
        entity
    }

    /// Creates a persona through the gateway. A `local_only` answer is also
    /// written to the cache so later reads can find it.
    pub async fn create_persona(&self, payload: &Value) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.url("/api/sorcerer-init"))
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::Network(error_chain(&e)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ClientError::Network(error_chain(&e)))?;
        let body = ParsedBody::parse(&raw).into_value();

        if !status.is_success() {
            let message = ["detail", "error"]
                .iter()
                .find_map(|k| body.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Launch failed with status {}.", status.as_u16()));
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if body.get("local_only").and_then(Value::as_bool).unwrap_or(false) {
            tracing::warn!("Persona was created locally only; caching it");
            if let Err(e) = self.cache.remember(body.clone()) {
                tracing::warn!("Could not cache local persona: {}", e);
            }
        }
        Ok(self.decorate(body))
    }

    pub async fn list_personas(&self) -> Result<Listing, ClientError> {
        if let Some(Value::Array(items)) = self.fetch("/api/backend/influencers?skip=0&limit=100").await {
            return Ok(Listing::Remote(
                items.into_iter().map(|e| self.decorate(e)).collect(),
            ));
        }
        let local = self.cache.entries()?;
        tracing::info!("Showing {} locally cached personas", local.len());
        Ok(Listing::Local(
            local.into_iter().map(|e| self.decorate(e)).collect(),
        ))
    }

    pub async fn get_persona(&self, id: &str) -> Result<Option<Value>, ClientError> {
        let path = format!("/api/backend/influencer/{}", urlencoding::encode(id));
        if let Some(entity) = self.fetch(&path).await {
            return Ok(Some(self.decorate(entity)));
        }
        Ok(self.cache.find(id)?.map(|e| self.decorate(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmetic_stats_are_stable_and_bounded() {
        let (f1, e1) = cosmetic_stats("alice", "42");
        let (f2, e2) = cosmetic_stats("alice", "42");
        assert_eq!((f1.clone(), e1.clone()), (f2, e2));
        assert!(f1.ends_with('M'));
        assert!(e1.ends_with('%'));
        let followers: f64 = f1.trim_end_matches('M').parse().unwrap();
        let engagement: f64 = e1.trim_end_matches('%').parse().unwrap();
        assert!((0.0..5.0).contains(&followers));
        assert!((0.0..5.0).contains(&engagement));
    }

    #[test]
    fn listing_reports_source() {
        let listing = Listing::Local(vec![serde_json::json!({ "id": 1 })]);
        assert!(listing.is_local());
        assert_eq!(listing.entities().len(), 1);
        assert!(!Listing::Remote(vec![]).is_local());
    }
}
