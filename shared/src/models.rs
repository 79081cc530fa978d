use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{is_zero_time, truncate_to_second, zero_time};

// ═══════════════════════════════════════════════════════════════════════════
// BOUND REQUEST RECORDS
// ═══════════════════════════════════════════════════════════════════════════

/// Both identifiers of `/parent/:parentId/children/:childId`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChildPath {
    #[serde(rename = "ParentID", default)]
    pub parent_id: String,
    #[serde(rename = "ChildID", default)]
    pub child_id: String,
}

/// JSON body accepted (and echoed) by `POST /body`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// Query string of `GET /query`
///
/// Timestamps the client omitted hold [`zero_time`]. `latest` is filled in
/// by [`QueryParams::with_default_latest`] once validation has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(rename = "Test", default)]
    pub test: String,
    #[serde(rename = "Earliest", default = "zero_time")]
    pub earliest: DateTime<Utc>,
    #[serde(rename = "Latest", default = "zero_time")]
    pub latest: DateTime<Utc>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            test: String::new(),
            earliest: zero_time(),
            latest: zero_time(),
        }
    }
}

impl QueryParams {
    /// Replace an unset `latest` with `now`, truncated to the second.
    pub fn with_default_latest(mut self, now: DateTime<Utc>) -> Self {
        if is_zero_time(&self.latest) {
            self.latest = truncate_to_second(now);
        }
        self
    }
}

/// Record assembled from the path (`id`), the query (`q`) and the JSON body
/// (`data`) of `PUT /all/:id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedParams {
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Query", default)]
    pub query: String,
    #[serde(rename = "data", default)]
    pub data: String,
}

/// Body of the authorized `POST /admin` write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminWrite {
    #[serde(default)]
    pub value: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPONSES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    pub message: String,
}

impl Pong {
    pub fn new() -> Self {
        Self {
            message: "pong".to_string(),
        }
    }
}

impl Default for Pong {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of `GET /user/:name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserLookup {
    Found { user: String, value: String },
    Missing { user: String, status: String },
}

impl UserLookup {
    pub fn from_entry(user: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => UserLookup::Found {
                user: user.into(),
                value,
            },
            None => UserLookup::Missing {
                user: user.into(),
                status: "no value".to_string(),
            },
        }
    }
}

/// Acknowledgement of a successful store write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub status: String,
}

impl WriteAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
