//! Score computation and interest lookup behind the two methods.
use crate::requests::OnlineScoreArguments;
use crate::store::{Store, StoreError};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Separator between cache key parts, so `("ab", "c")` and `("a", "bc")` differ.
const KEY_SEPARATOR: &[u8] = b"\x1f";

/// Scoring cache key for a caller and argument set.
pub fn score_cache_key(login: &str, args: &OnlineScoreArguments) -> String {
    let birthday = args
        .birthday
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_default();
    let parts = [
        login,
        args.first_name.as_deref().unwrap_or_default(),
        args.last_name.as_deref().unwrap_or_default(),
        args.phone.as_deref().unwrap_or_default(),
        birthday.as_str(),
    ];

    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(KEY_SEPARATOR);
    }
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Weighted score of the supplied fields. Always non-negative.
pub fn compute_score(args: &OnlineScoreArguments) -> f64 {
    let mut score = 0.0;
    if args.phone.is_some() {
        score += 1.5;
    }
    if args.email.is_some() {
        score += 1.5;
    }
    if args.birthday.is_some() && args.gender.is_some() {
        score += 1.5;
    }
    if args.first_name.is_some() && args.last_name.is_some() {
        score += 0.5;
    }
    score
}

/// Returns the cached score when available, otherwise computes and caches it.
///
/// Cache failures are logged and never fail the call.
pub async fn get_score(
    store: &dyn Store,
    login: &str,
    args: &OnlineScoreArguments,
    ttl: Duration,
) -> f64 {
    let key = score_cache_key(login, args);

    match store.cache_get(&key).await {
        Ok(Some(cached)) => match cached.parse::<f64>() {
            Ok(score) => {
                tracing::debug!("Score cache HIT for {}", key);
                return score;
            }
            Err(_) => tracing::warn!("Ignoring unreadable cached score for {}", key),
        },
        Ok(None) => tracing::debug!("Score cache MISS for {}", key),
        Err(e) => tracing::warn!("Score cache read failed: {}", e),
    }

    let score = compute_score(args);
    if let Err(e) = store.cache_set(&key, score.to_string(), ttl).await {
        tracing::warn!("Score cache write failed: {}", e);
    }
    score
}

/// Interests of one client. A missing entry is an empty list, not an error.
pub async fn get_interests(store: &dyn Store, client_id: i64) -> Result<Vec<String>, StoreError> {
    let key = format!("i:{}", client_id);
    match store.get(&key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", key, e))),
        None => Ok(Vec::new()),
    }
}
