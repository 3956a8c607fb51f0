use serde::{Deserialize, Serialize};

/// Ledger owner; `username` is the natural key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub created_ts: i64,
}
