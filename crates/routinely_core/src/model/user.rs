//! User profile record, read-only from core's perspective.

use serde::{Deserialize, Serialize};

/// Profile document stored under the user's id; core never writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Sign-up instant, epoch seconds.
    pub joined: i64,
}
