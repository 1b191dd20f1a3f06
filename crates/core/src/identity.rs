//! Visitor and session identity.
//!
//! Identifiers are minted on the client and persisted there: the visitor id
//! durably, the session id for one browser session. The recorder receives
//! them explicitly through [`IdentityContext`].

use std::sync::LazyLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum identifier length accepted from clients.
pub const MAX_IDENTITY_LEN: usize = 128;

/// Prefix of generated visitor ids.
pub const VISITOR_PREFIX: &str = "visitor";

/// Prefix of generated session ids.
pub const SESSION_PREFIX: &str = "session";

/// Length of the random base-36 segment.
const RANDOM_SEGMENT_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static GENERATED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(visitor|session)_([0-9a-z]{9})_([0-9]+)$").expect("valid identity regex")
});

/// Visitor and session identifiers threaded into every tracking call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityContext {
    pub visitor_id: String,
    pub session_id: String,
}

impl IdentityContext {
    /// Wraps identifiers supplied by the client.
    pub fn new(visitor_id: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let visitor_id = visitor_id.into();
        let session_id = session_id.into();
        check_id("visitor_id", &visitor_id)?;
        check_id("session_id", &session_id)?;
        Ok(Self {
            visitor_id,
            session_id,
        })
    }

    /// Mints a fresh visitor and session.
    pub fn generate() -> Self {
        Self {
            visitor_id: generate_id(VISITOR_PREFIX),
            session_id: generate_id(SESSION_PREFIX),
        }
    }

    /// Same visitor, new browser session.
    pub fn with_new_session(&self) -> Self {
        Self {
            visitor_id: self.visitor_id.clone(),
            session_id: generate_id(SESSION_PREFIX),
        }
    }
}

fn check_id(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_identity(format!("{} is empty", field)));
    }
    if value.len() > MAX_IDENTITY_LEN {
        return Err(Error::invalid_identity(format!(
            "{} exceeds {} chars",
            field, MAX_IDENTITY_LEN
        )));
    }
    Ok(())
}

/// Generates `<prefix>_<random>_<unix millis>`.
pub fn generate_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_SEGMENT_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, random, Utc::now().timestamp_millis())
}

/// Returns true if `id` has the generated shape for `prefix`.
pub fn is_generated_id(prefix: &str, id: &str) -> bool {
    GENERATED_ID
        .captures(id)
        .map(|caps| &caps[1] == prefix)
        .unwrap_or(false)
}
