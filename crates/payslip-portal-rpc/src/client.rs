//! HTTP transport for the record service's JSON-RPC web endpoints

use crate::error::{RpcError, RpcResult};
use payslip_portal_config::BackendConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: String,
}

/// Wrap `params` in a JSON-RPC 2.0 call envelope
pub fn envelope(id: u64, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": params,
        "id": id,
    })
}

/// Extract the result of a JSON-RPC response body
pub fn parse_response(body: &[u8]) -> RpcResult<Value> {
    let response: RpcResponse = serde_json::from_slice(body)?;
    if let Some(error) = response.error {
        let message = error
            .data
            .map(|d| d.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(error.message);
        return Err(RpcError::Server {
            code: error.code,
            message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// Route serving the PDF rendering of `report_name` for `ids`
pub fn report_path(report_name: &str, ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("/report/pdf/{}/{}", report_name, ids.join(","))
}

/// A logged-in session against the record service
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    base_url: String,
    database: String,
    login: String,
    password: String,
    uid: Mutex<Option<i64>>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(config: &BackendConfig) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            database: config.database.clone(),
            login: config.login.clone(),
            password: config.password.clone(),
            uid: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// User id of the service session, if logged in
    pub fn uid(&self) -> Option<i64> {
        *self.uid.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a web session; the session cookie is kept by the client
    pub async fn authenticate(&self) -> RpcResult<i64> {
        let params = json!({
            "db": self.database,
            "login": self.login,
            "password": self.password,
        });
        let result = self
            .post("/web/session/authenticate", params)
            .await
            .map_err(|err| match err {
                RpcError::Server { message, .. } => RpcError::Auth(message),
                other => other,
            })?;

        let uid = result
            .get("uid")
            .and_then(Value::as_i64)
            .ok_or_else(|| RpcError::Auth(format!("login '{}' was rejected", self.login)))?;

        *self.uid.lock().unwrap_or_else(|e| e.into_inner()) = Some(uid);
        log::info!("Authenticated against {} as uid {}", self.base_url, uid);
        Ok(uid)
    }

    /// Call `method` on `model` through `call_kw`, logging in first if needed
    pub async fn call_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Value,
    ) -> RpcResult<Value> {
        self.ensure_session().await?;

        let path = format!("/web/dataset/call_kw/{}/{}", model, method);
        let params = json!({
            "model": model,
            "method": method,
            "args": args,
            "kwargs": kwargs,
        });

        match self.post(&path, params.clone()).await {
            Err(err) if err.is_session_expired() => {
                log::warn!("Session expired, logging in again");
                self.authenticate().await?;
                self.post(&path, params).await
            }
            other => other,
        }
    }

    /// Fetch the PDF rendering of a report, logging in again once if the
    /// backend answers with its login page
    pub async fn download_report(
        &self,
        report_name: &str,
        ids: &[i64],
    ) -> RpcResult<(Vec<u8>, String)> {
        self.ensure_session().await?;

        let url = format!("{}{}", self.base_url, report_path(report_name, ids));
        if let Some(document) = self.get_document(&url, report_name).await? {
            return Ok(document);
        }

        log::warn!("Report {} answered with a login page, logging in again", report_name);
        self.authenticate().await?;
        self.get_document(&url, report_name).await?.ok_or_else(|| {
            RpcError::InvalidResponse(format!("report {} returned an HTML page", report_name))
        })
    }

    /// `None` when the backend served an HTML page instead of a document
    async fn get_document(
        &self,
        url: &str,
        report_name: &str,
    ) -> RpcResult<Option<(Vec<u8>, String)>> {
        log::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "report {} returned HTTP {}",
                report_name, status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        if content_type.starts_with("text/html") {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        Ok(Some((bytes.to_vec(), content_type)))
    }

    async fn ensure_session(&self) -> RpcResult<()> {
        if self.uid().is_none() {
            self.authenticate().await?;
        }
        Ok(())
    }

    async fn post(&self, path: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {} (rpc id {})", url, id);

        let response = self
            .http
            .post(&url)
            .json(&envelope(id, params))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }
        parse_response(&bytes)
    }
}
