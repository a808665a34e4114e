// Owner key auth for operator/owner-facing endpoints
// Decision: owner keys are prefixed with "emb_" for identification
// Decision: full key is shown only once at widget creation, stored hashed

use axum::http::{header, HeaderMap};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use emberchat_core::Widget;

use crate::common::ApiError;

/// Owner key prefix for identification
pub const OWNER_KEY_PREFIX: &str = "emb_";
const OWNER_KEY_LENGTH: usize = 32; // 32 random bytes = 64 hex chars

/// Generated owner key (full key shown only at creation)
#[derive(Debug)]
pub struct GeneratedOwnerKey {
    /// Full key (emb_<random>)
    pub key: String,
    /// SHA-256 hash for registry storage
    pub key_hash: String,
    /// Prefix for display (e.g., "emb_abc1...")
    pub key_prefix: String,
}

/// Generate a new owner key
pub fn generate_owner_key() -> GeneratedOwnerKey {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..OWNER_KEY_LENGTH).map(|_| rng.gen()).collect();
    let random_hex = hex::encode(&random_bytes);

    let key = format!("{}{}", OWNER_KEY_PREFIX, random_hex);
    let key_hash = hash_owner_key(&key);
    let key_prefix = format!("{}{}...", OWNER_KEY_PREFIX, &random_hex[..8]);

    GeneratedOwnerKey {
        key,
        key_hash,
        key_prefix,
    }
}

/// Hash an owner key for registry storage/lookup
pub fn hash_owner_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

/// Validate owner key format
pub fn is_valid_owner_key_format(key: &str) -> bool {
    if !key.starts_with(OWNER_KEY_PREFIX) {
        return false;
    }

    let key_part = &key[OWNER_KEY_PREFIX.len()..];
    key_part.len() == OWNER_KEY_LENGTH * 2 && key_part.chars().all(|c| c.is_ascii_hexdigit())
}

// ============================================================================
// OwnerKeyRegistry - hashed key -> owner id
// ============================================================================

/// In-memory registry of hashed owner keys.
///
/// The account system owning durable credentials is external; this registry
/// holds the keys minted by widget registration for the life of the process.
#[derive(Debug, Default, Clone)]
pub struct OwnerKeyRegistry {
    keys: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl OwnerKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, key_hash: String, owner_id: Uuid) {
        self.keys.write().await.insert(key_hash, owner_id);
    }

    /// Owner id for a presented key, or None for an unknown key
    pub async fn resolve(&self, key: &str) -> Option<Uuid> {
        if !is_valid_owner_key_format(key) {
            return None;
        }
        self.keys.read().await.get(&hash_owner_key(key)).copied()
    }
}

/// Extract the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Resolve the caller and require them to own the widget.
///
/// 401 when no/unknown credentials are presented, 403 when the caller is
/// authenticated but not the widget's owner.
pub async fn require_owner(
    registry: &OwnerKeyRegistry,
    headers: &HeaderMap,
    widget: &Widget,
) -> Result<Uuid, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    let caller = registry
        .resolve(token)
        .await
        .ok_or(ApiError::Unauthorized)?;

    if caller != widget.owner_id {
        return Err(ApiError::Forbidden);
    }
    Ok(caller)
}
