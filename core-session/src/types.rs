//! Core data model and wire types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current schema version of [`EncryptedPayload`].
///
/// Payloads with any other version are treated as absent and their slot is
/// wiped.
pub const PAYLOAD_VERSION: u32 = 1;

/// In-memory authentication status.
///
/// Never persisted (deliberately no `Serialize`); the durable record of a
/// session is the protected cookie on the server side. Created as
/// unauthenticated at process start and overwritten wholesale by the four
/// lifecycle operations only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub user_id: Option<String>,
    /// Access-token expiry, Unix epoch milliseconds
    pub access_expires_at: Option<i64>,
    /// Refresh-token expiry, Unix epoch milliseconds
    pub refresh_expires_at: Option<i64>,
}

impl SessionStatus {
    /// The unauthenticated baseline state.
    pub fn signed_out() -> Self {
        Self::default()
    }
}

/// Login credentials supplied by the UI.
#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Contextual fields sent with login and refresh calls.
#[derive(Debug, Clone, Serialize)]
pub struct ClientContext {
    pub device_fingerprint: String,
    pub timezone: String,
    pub user_agent: String,
}

/// `POST /login` request body.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub device_fingerprint: &'a str,
    pub timezone: &'a str,
    pub user_agent: &'a str,
}

/// `POST /refresh` request body.
#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub device_fingerprint: &'a str,
    pub timezone: &'a str,
    pub user_agent: &'a str,
}

/// Response shape shared by `POST /login` and `POST /refresh`.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub success: bool,
    pub message: Option<String>,
    pub user_id: Option<String>,
    pub access_expires_at: Option<i64>,
    pub refresh_expires_at: Option<i64>,
}

/// `GET /session` response.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub access_expires_at: Option<i64>,
    pub refresh_expires_at: Option<i64>,
}

/// `GET /csrf-token` response.
#[derive(Debug, Deserialize)]
pub(crate) struct CsrfTokenResponse {
    pub csrf_token: Option<String>,
}

/// Durable representation of vault-sealed data.
///
/// Binary fields are hex-encoded in the stored JSON. A payload that fails to
/// parse, carries a wrong-length IV, or has a version other than
/// [`PAYLOAD_VERSION`] is treated as absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub version: u32,
    #[serde(with = "hex_serde")]
    pub iv: Vec<u8>,
    #[serde(with = "hex_serde")]
    pub ciphertext: Vec<u8>,
}

// Hex serialization helper for serde
pub(crate) mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
