use crate::errors::RequestError;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

/// Thin JSON client for the remote portal API.
///
/// Every request declares a JSON content type and carries the session cookie
/// jar, so a login on one call is visible to the next.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Value, RequestError> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, RequestError> {
        self.call(Method::POST, path, body).await
    }

    pub async fn get_as<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, RequestError> {
        Ok(decode(path, self.get(path).await?))
    }

    pub async fn post_as<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, RequestError> {
        Ok(decode(path, self.post(path, body).await?))
    }

    /// Issues one request. A success status with an empty or non-JSON body
    /// yields `Value::Null`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let path = normalize_path(path);
        let url = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(|err| {
            error!("request to {path} failed: {err}");
            RequestError::transport(&err)
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            error!("reading body from {path} failed: {err}");
            RequestError::transport(&err)
        })?;

        let data = parse_body(&text);
        if !status.is_success() {
            let message = server_message(&data)
                .map(str::to_string)
                .or_else(|| (!text.is_empty()).then(|| text.clone()))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            error!("request to {path} returned {status}: {message}");
            return Err(RequestError {
                message,
                status: Some(status.as_u16()),
                raw_body: text,
            });
        }

        Ok(data)
    }
}

/// Rewrites the bare aliases older callers still use.
pub fn normalize_path(path: &str) -> &str {
    if path.starts_with('/') || path.starts_with("http") {
        return path;
    }
    match path {
        "projects" => {
            warn!("normalized short path \"projects\" to \"/api/projects\"");
            "/api/projects"
        }
        "user" => {
            warn!("normalized short path \"user\" to \"/api/user\"");
            "/api/user"
        }
        other => other,
    }
}

fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}

fn server_message(data: &Value) -> Option<&str> {
    ["message", "error"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
}

fn decode<T: DeserializeOwned + Default>(path: &str, value: Value) -> T {
    if value.is_null() {
        return T::default();
    }
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("unexpected response shape from {path}: {err}");
            T::default()
        }
    }
}
