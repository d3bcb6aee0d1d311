//! REST client for the agent API: command execution and history, plus the
//! system info and file search endpoints used by the one-shot modes.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::commands::CommandBackend;
use crate::types::{
    CommandRecord, ExecuteResponse, FileHit, FileSearchPayload, HistoryPayload, ProcessInfo,
    ProcessesPayload, Reply, TelemetrySample,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported url scheme '{0}'")]
    Scheme(String),
    /// The agent answered with `{"error": ...}`.
    #[error("agent error: {0}")]
    Remote(String),
}

/// Derive the REST base from the telemetry socket address:
/// `ws://host:8000/ws` -> `http://host:8000/`.
pub fn base_from_ws_url(ws: &str) -> Result<Url, ApiError> {
    let mut u = Url::parse(ws)?;
    let scheme = match u.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => return Err(ApiError::Scheme(other.to_string())),
    };
    u.set_scheme(scheme)
        .map_err(|_| ApiError::Scheme(scheme.to_string()))?;
    u.set_path("/");
    u.set_query(None);
    u.set_fragment(None);
    Ok(u)
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::Scheme(base.scheme().to_string()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let reply = self
            .http
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Reply<T>>()
            .await?;
        match reply {
            Reply::Ok(v) => Ok(v),
            Reply::Failed { error } => Err(ApiError::Remote(error)),
        }
    }

    /// `POST /api/commands/execute?command=...`
    pub async fn execute(&self, command: &str) -> Result<ExecuteResponse, ApiError> {
        let resp = self
            .http
            .post(self.endpoint("/api/commands/execute")?)
            .query(&[("command", command)])
            .send()
            .await?
            .error_for_status()?
            .json::<ExecuteResponse>()
            .await?;
        Ok(resp)
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<CommandRecord>, ApiError> {
        let p: HistoryPayload = self
            .get("/api/commands/history", &[("limit", limit.to_string())])
            .await?;
        Ok(p.history)
    }

    pub async fn system_info(&self) -> Result<serde_json::Value, ApiError> {
        self.get("/api/system/info", &[]).await
    }

    pub async fn system_stats(&self) -> Result<TelemetrySample, ApiError> {
        self.get("/api/system/stats", &[]).await
    }

    pub async fn processes(&self, limit: usize) -> Result<Vec<ProcessInfo>, ApiError> {
        let p: ProcessesPayload = self
            .get("/api/system/processes", &[("limit", limit.to_string())])
            .await?;
        Ok(p.processes)
    }

    pub async fn search_files(
        &self,
        pattern: &str,
        directory: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FileHit>, ApiError> {
        let mut q = vec![("pattern", pattern.to_string()), ("limit", limit.to_string())];
        if let Some(d) = directory {
            q.push(("directory", d.to_string()));
        }
        let p: FileSearchPayload = self.get("/api/files/search", &q).await?;
        Ok(p.results)
    }
}

impl CommandBackend for ApiClient {
    async fn execute(&self, command: &str) -> Result<ExecuteResponse, ApiError> {
        ApiClient::execute(self, command).await
    }
}
