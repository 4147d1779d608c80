//! Authenticated request execution against the data-migration plugin.
//!
//! The gateway attaches the session credential, resolves paths under
//! `/plugins/data-migration/{resource|migration}`, and turns transport
//! failures into [`DataKitError`]. It never interprets the logical `code`
//! carried in response bodies; callers do that through [`ApiResponse`].

use datakit_model::schema::{
    MIGRATION_SCOPE,
    PLUGIN_BASE_PATH,
    RESOURCE_SCOPE,
    SUCCESS_CODE,
    UNAUTHORIZED_CODE,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{DataKitError, DataKitResult};
use crate::session::Credential;

/// Sub-path of the plugin API a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiScope {
    Resource,
    Migration,
}

impl ApiScope {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Resource => RESOURCE_SCOPE,
            Self::Migration => MIGRATION_SCOPE,
        }
    }
}

/// Stateless request executor bound to one server and one credential.
#[derive(Clone, Debug)]
pub struct Gateway {
    client: Client,
    server_url: String,
    credential: Credential,
}

impl Gateway {
    #[must_use]
    pub fn new(client: Client, server_url: impl Into<String>, credential: Credential) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            server_url,
            credential,
        }
    }

    /// Full url of `path` under `scope`. `path` starts with `/` and may carry
    /// a query string.
    #[must_use]
    pub fn url(&self, scope: ApiScope, path: &str) -> String {
        format!(
            "{}{PLUGIN_BASE_PATH}/{}{path}",
            self.server_url,
            scope.segment()
        )
    }

    /// Issues a GET request.
    ///
    /// # Errors
    /// Returns `DataKitError` on transport failure or an unreadable body.
    pub async fn get(&self, scope: ApiScope, path: &str) -> DataKitResult<ApiResponse> {
        let (url, request) = self.request(Method::GET, scope, path);
        send(url, request).await
    }

    /// Issues a POST request without a body.
    ///
    /// # Errors
    /// Returns `DataKitError` on transport failure or an unreadable body.
    pub async fn post(&self, scope: ApiScope, path: &str) -> DataKitResult<ApiResponse> {
        let (url, request) = self.request(Method::POST, scope, path);
        send(url, request).await
    }

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    /// Returns `DataKitError` on transport failure or an unreadable body.
    pub async fn post_json<B>(&self, scope: ApiScope, path: &str, body: &B) -> DataKitResult<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let (url, request) = self.request(Method::POST, scope, path);
        send(url, request.json(body)).await
    }

    /// Issues a POST request with a form-encoded body.
    ///
    /// # Errors
    /// Returns `DataKitError` on transport failure or an unreadable body.
    pub async fn post_form(
        &self,
        scope: ApiScope,
        path: &str,
        form: &[(&str, &str)],
    ) -> DataKitResult<ApiResponse> {
        let (url, request) = self.request(Method::POST, scope, path);
        send(url, request.form(form)).await
    }

    fn request(&self, method: Method, scope: ApiScope, path: &str) -> (String, RequestBuilder) {
        let url = self.url(scope, path);
        debug!(%method, %url, "calling DataKit");
        let request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, self.credential.header_value().clone());
        (url, request)
    }
}

pub(crate) async fn send(url: String, request: RequestBuilder) -> DataKitResult<ApiResponse> {
    let response = request
        .send()
        .await
        .map_err(|err| transport_error(&url, err))?;
    ApiResponse::read(url, response).await
}

pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> DataKitError {
    if err.is_connect() {
        DataKitError::ServiceUnreachable {
            url: url.to_string(),
            source: Box::new(err),
        }
    } else {
        DataKitError::Gateway {
            url: url.to_string(),
            source: Box::new(err),
        }
    }
}

/// Decoded JSON body of a `DataKit` response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    endpoint: String,
    status: u16,
    body: Value,
}

impl ApiResponse {
    async fn read(endpoint: String, response: Response) -> DataKitResult<Self> {
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_error(&endpoint, err))?;
        match serde_json::from_slice(&bytes) {
            Ok(body) => Ok(Self {
                endpoint,
                status,
                body,
            }),
            Err(err) => Err(DataKitError::MalformedResponse {
                endpoint,
                status,
                message: err.to_string(),
            }),
        }
    }

    /// Wraps an already decoded body.
    #[must_use]
    pub fn from_parts(endpoint: impl Into<String>, status: u16, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            status,
            body,
        }
    }

    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Logical result code from the body.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.body.get("code").and_then(Value::as_i64)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code() == Some(SUCCESS_CODE)
    }

    /// Human readable failure reason: `data` when it is a message, otherwise
    /// `msg`, otherwise the code itself.
    #[must_use]
    pub fn reason(&self) -> String {
        let text = |key: &str| {
            self.body
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        text("data").or_else(|| text("msg")).unwrap_or_else(|| {
            self.code().map_or_else(
                || format!("HTTP {} without a result code", self.status),
                |code| format!("result code {code}"),
            )
        })
    }

    /// Checks the logical code.
    ///
    /// # Errors
    /// Returns `SessionExpired` for the unauthorized code and
    /// `UpstreamRejected` for any other non-success code.
    pub fn ensure_success(&self) -> DataKitResult<()> {
        match self.code() {
            Some(SUCCESS_CODE) => Ok(()),
            Some(UNAUTHORIZED_CODE) => Err(DataKitError::SessionExpired {
                reason: self.reason(),
            }),
            code => Err(DataKitError::UpstreamRejected {
                endpoint: self.endpoint.clone(),
                code: code.unwrap_or_else(|| i64::from(self.status)),
                reason: self.reason(),
            }),
        }
    }

    /// Decodes the value at a JSON pointer such as `/data` or `/rows`.
    /// Missing and null values decode as `T::default()`.
    ///
    /// # Errors
    /// Returns `MalformedResponse` if the value does not match `T`.
    pub fn decode<T>(&self, pointer: &str) -> DataKitResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.body.pointer(pointer) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => T::deserialize(value).map_err(|err| DataKitError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                status: self.status,
                message: format!("{pointer}: {err}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reason_prefers_data_then_msg() {
        let response = ApiResponse::from_parts(
            "save",
            200,
            json!({"code": 500, "msg": "failure", "data": "task name already exists"}),
        );
        assert_eq!(response.reason(), "task name already exists");

        let response = ApiResponse::from_parts("save", 200, json!({"code": 500, "msg": "failure", "data": null}));
        assert_eq!(response.reason(), "failure");

        let response = ApiResponse::from_parts("save", 502, json!({}));
        assert_eq!(response.reason(), "HTTP 502 without a result code");
    }

    #[test]
    fn ensure_success_distinguishes_expired_sessions() {
        let ok = ApiResponse::from_parts("list", 200, json!({"code": 200}));
        assert!(ok.ensure_success().is_ok());

        let expired = ApiResponse::from_parts("list", 200, json!({"code": 401, "msg": "token expired"}));
        assert!(matches!(
            expired.ensure_success(),
            Err(DataKitError::SessionExpired { reason }) if reason == "token expired"
        ));

        let rejected = ApiResponse::from_parts("list", 200, json!({"code": 500, "msg": "boom"}));
        assert!(matches!(
            rejected.ensure_success(),
            Err(DataKitError::UpstreamRejected { code: 500, .. })
        ));
    }

    #[test]
    fn decode_treats_missing_as_empty() {
        let response = ApiResponse::from_parts("list", 200, json!({"code": 200, "rows": null}));
        let rows: Vec<String> = response.decode("/rows").expect("null rows should decode");
        assert!(rows.is_empty());

        let response = ApiResponse::from_parts("list", 200, json!({"code": 200, "data": {"x": 1}}));
        let err = response
            .decode::<Vec<String>>("/data")
            .expect_err("object is not a list");
        assert!(matches!(err, DataKitError::MalformedResponse { .. }));
    }
}
