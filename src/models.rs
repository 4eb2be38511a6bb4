use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

// --- Identity ---

/// Identity
///
/// The normalized identity of the signed-in user, as held by the session.
/// Serialized field names are the canonical snake_case ones, which `RawIdentity`
/// reads back unchanged, so normalization is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Identity {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

/// RawIdentity
///
/// The `/auth/me` body as different backend revisions emit it. Every spelling is
/// kept in its own slot so a body carrying two of them still deserializes.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawIdentity {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "displayName")]
    pub display_name_camel: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default, rename = "isAdmin")]
    pub is_admin_camel: Option<bool>,
}

impl From<RawIdentity> for Identity {
    fn from(raw: RawIdentity) -> Self {
        Identity {
            id: raw.id,
            email: raw.email,
            // First spelling present wins: snake_case, then camelCase, then the legacy username.
            display_name: raw.display_name.or(raw.display_name_camel).or(raw.username),
            is_admin: raw.is_admin.or(raw.is_admin_camel).unwrap_or(false),
        }
    }
}

/// normalize_user
///
/// Turns an arbitrary `/auth/me` body into an `Identity`. `null` and
/// non-object bodies yield `None`; missing optional fields are tolerated.
pub fn normalize_user(value: &Value) -> Option<Identity> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value::<RawIdentity>(value.clone()) {
        Ok(raw) => Some(raw.into()),
        Err(e) => {
            tracing::warn!("identity body did not match any known shape: {}", e);
            None
        }
    }
}

// --- Events ---

/// Event
///
/// A listing as returned by `GET /events`. `created_by` and `creator_name` are
/// display-only back-references to the author and never feed authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "lenient_utc")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_utc")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(deserialize_with = "lenient_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_utc")]
    pub updated_at: DateTime<Utc>,
    // Rows from backends without a moderation column land in the review queue.
    #[serde(default = "pending_by_default")]
    pub pending: bool,
}

fn pending_by_default() -> bool {
    true
}

/// Accepts RFC 3339 timestamps and offset-less ones, which are read as UTC.
fn lenient_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// EventPayload
///
/// Body for `POST /events` and `PUT /events/{id}`. Every field is optional and
/// omitted from the JSON when unset, so callers send only what the form holds.
/// `pending` is overwritten by the event store before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,
}

impl EventPayload {
    /// Shorthand for a payload that only carries a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

// --- Auth payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// The register endpoint expects `displayName` in camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub password: String,
}

/// AuthResponse
///
/// Login/register response. Only `access_token` drives the session; everything
/// else is kept verbatim in `extra` for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// --- Admin payloads ---

/// UserRecord
///
/// One row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    #[serde(default, alias = "username", alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUpdate {
    pub is_admin: bool,
}
