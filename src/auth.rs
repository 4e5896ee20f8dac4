//! Token checks for the two principal classes.
//!
//! Regular callers present `hex(sha512(account + login + salt))`. The admin
//! login presents `hex(sha512(YYYYMMDDHH + admin_salt))`, rendered in the
//! server's local time, so its token rotates every hour.
use crate::requests::MethodRequest;
use chrono::{DateTime, Local};
use sha2::{Digest, Sha512};
use std::fmt;

/// Admin token window format: local wall clock truncated to the hour.
pub const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Secrets injected into the authentication gate.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub salt: String,
    pub admin_login: String,
    pub admin_salt: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("salt", &"<redacted>")
            .field("admin_login", &self.admin_login)
            .field("admin_salt", &"<redacted>")
            .finish()
    }
}

/// Identity class of a caller, recomputed for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin,
    Regular { account: String, login: String },
}

impl AuthConfig {
    pub fn principal(&self, request: &MethodRequest) -> Principal {
        if request.login == self.admin_login {
            Principal::Admin
        } else {
            Principal::Regular {
                account: request.account.clone().unwrap_or_default(),
                login: request.login.clone(),
            }
        }
    }

    /// Token the caller is expected to present at `now`.
    pub fn expected_token(&self, principal: &Principal, now: DateTime<Local>) -> String {
        match principal {
            Principal::Admin => {
                let hour = now.format(ADMIN_HOUR_FORMAT).to_string();
                sha512_hex(&[hour.as_str(), self.admin_salt.as_str()])
            }
            Principal::Regular { account, login } => {
                sha512_hex(&[account.as_str(), login.as_str(), self.salt.as_str()])
            }
        }
    }

    /// Returns the principal when the supplied token matches, `None` otherwise.
    pub fn authenticate(&self, request: &MethodRequest, now: DateTime<Local>) -> Option<Principal> {
        let principal = self.principal(request);
        let expected = self.expected_token(&principal, now);
        constant_time_compare(&request.token, &expected).then_some(principal)
    }
}

fn sha512_hex(parts: &[&str]) -> String {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
