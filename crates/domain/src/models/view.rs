//! View tracking models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A recorded catalog view. Views are append-only and never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: i64,
    pub application_id: Uuid,
    pub viewer_id: String,
    pub viewer_username: String,
    pub viewed_at: DateTime<Utc>,
}

/// Fields needed to record a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewView {
    pub application_id: Uuid,
    pub viewer_id: String,
    pub viewer_username: String,
}

/// Request to record a view of a catalog entry.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewRequest {
    #[serde(default)]
    #[validate(required(message = "applicationId is required"))]
    pub application_id: Option<Uuid>,

    /// Chat user ids arrive as numbers from the web app; both forms are accepted.
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(
        required(message = "viewerId is required"),
        length(min = 1, max = 64, message = "viewerId must be 1-64 characters")
    )]
    pub viewer_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 64, message = "viewerUsername must be at most 64 characters"))]
    pub viewer_username: Option<String>,
}

/// Response after recording a view.
#[derive(Debug, Clone, Serialize)]
pub struct TrackViewResponse {
    pub success: bool,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s.trim().to_string(),
        Raw::Int(n) => n.to_string(),
    }))
}
