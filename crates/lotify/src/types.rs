//! LINE Notify API types
//!
//! Fields added upstream are kept in `extra` so responses reach callers intact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `POST /oauth/token` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Target kind of an access token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetType {
    User,
    Group,
    #[serde(other)]
    Unknown,
}

/// `GET /api/status` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// Value according to HTTP status code
    pub status: u16,
    /// Message visible to end-user
    pub message: String,
    #[serde(rename = "targetType")]
    pub target_type: TargetType,
    /// User or group name. `None` when it could not be acquired.
    #[serde(default)]
    pub target: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /api/notify` and `POST /api/revoke` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error body shape used when extracting a message from a non-2xx response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Form parameters for `POST /api/notify`
///
/// Optional fields are omitted from the request body when unset.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotifyMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_fullsize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_package_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_disabled: Option<bool>,
}

impl NotifyMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attach an image by URL (thumbnail and full size)
    pub fn with_image(mut self, thumbnail: impl Into<String>, fullsize: impl Into<String>) -> Self {
        self.image_thumbnail = Some(thumbnail.into());
        self.image_fullsize = Some(fullsize.into());
        self
    }

    pub fn with_sticker(mut self, package_id: u32, sticker_id: u32) -> Self {
        self.sticker_package_id = Some(package_id);
        self.sticker_id = Some(sticker_id);
        self
    }

    /// Deliver without a push notification sound
    pub fn silent(mut self) -> Self {
        self.notification_disabled = Some(true);
        self
    }
}
