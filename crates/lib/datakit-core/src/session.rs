//! Login to `DataKit` and the credential shared by every later call.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use datakit_model::LoginRequest;
use datakit_model::schema::LOGIN_PATH;
use reqwest::Client;
use reqwest::header::HeaderValue;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{DataKitError, DataKitResult};
use crate::gateway::{Gateway, send};

/// Public half of the key `DataKit` uses to decrypt login passwords
/// (base64 DER, `SubjectPublicKeyInfo`).
const DATAKIT_PUBLIC_KEY: &str = concat!(
    "MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDxRJAwJGMHBOKHW3nHFHaXylHy",
    "t+ZrXNDOsbbZqCwgfTGrE9Jw6A+WQY/jiDEqThuMKLhb7z8//w6fmPu0kLdAmc1n",
    "qkmozOOVt+1BgRqsVckJjw7eiRflqsDZEIgtnUMX61eyMcIGPHzxdL3XmlaPf1Qp",
    "gPXBWQaNl4I7qJ2LoQIDAQAB",
);

/// Bearer token header for one authenticated session.
#[derive(Clone)]
pub struct Credential(HeaderValue);

impl Credential {
    /// Wraps a login token as `Bearer <token>`.
    ///
    /// # Errors
    /// Returns `MalformedResponse` if the token is not a valid header value.
    pub fn bearer(token: &str) -> DataKitResult<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
            DataKitError::MalformedResponse {
                endpoint: LOGIN_PATH.to_string(),
                status: 200,
                message: format!("login token is not a valid header value: {err}"),
            }
        })?;
        value.set_sensitive(true);
        Ok(Self(value))
    }

    #[must_use]
    pub const fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Where and as whom to log in.
#[derive(Clone)]
pub struct SessionConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

impl SessionConfig {
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Encrypts a password with the `DataKit` public key (RSA, PKCS#1 v1.5) and
/// returns it base64 encoded.
///
/// # Errors
/// Returns `Encryption` if the key cannot be loaded or the password is too
/// long for the key.
pub fn encrypt_password(raw_password: &str) -> DataKitResult<String> {
    let der = STANDARD
        .decode(DATAKIT_PUBLIC_KEY)
        .map_err(|err| DataKitError::Encryption(err.to_string()))?;
    let key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|err| DataKitError::Encryption(err.to_string()))?;
    let mut rng = rand::thread_rng();
    let encrypted = key
        .encrypt(&mut rng, Pkcs1v15Encrypt, raw_password.as_bytes())
        .map_err(|err| DataKitError::Encryption(err.to_string()))?;
    Ok(STANDARD.encode(encrypted))
}

/// Logs in once and returns the gateway every later call goes through.
///
/// Certificate validation is disabled for the configured server: `DataKit`
/// deployments serve self-signed certificates.
///
/// # Errors
/// Returns `ServiceUnreachable` when the server cannot be reached and
/// `AuthenticationFailed` when the login is rejected.
pub async fn acquire_session(config: &SessionConfig) -> DataKitResult<Gateway> {
    let server_url = config.server_url.trim_end_matches('/').to_string();
    let url = format!("{server_url}{LOGIN_PATH}");
    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|err| DataKitError::Gateway {
            url: url.clone(),
            source: Box::new(err),
        })?;

    let body = LoginRequest {
        username: config.username.clone(),
        password: encrypt_password(&config.password)?,
    };
    let request = client.post(&url).json(&body);
    let response = send(url, request).await?;

    if !response.is_success() {
        warn!(
            username = %config.username,
            reason = %response.reason(),
            "DataKit login rejected"
        );
        return Err(DataKitError::AuthenticationFailed {
            username: config.username.clone(),
        });
    }

    let token = response
        .body()
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| DataKitError::AuthenticationFailed {
            username: config.username.clone(),
        })?;
    let credential = Credential::bearer(token)?;

    info!(username = %config.username, server = %server_url, "logged in to DataKit");
    Ok(Gateway::new(client, server_url, credential))
}
