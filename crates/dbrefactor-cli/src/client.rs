use std::time::Duration;

use dbrefactor_core::{Operation, TableInfo, normalize_schema};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{
    AnalyzeSchemaRequest, CleanupRequest, CleanupResponse, CodeFixRequest, CodeFixResponse,
    CodeFixResult, ConnectRequest, ConnectResponse, Connection, DisconnectRequest,
    GenerationOptions, RefactorPlanDto, RefactorRequest, RefactorResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to connect to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-2xx answer. The message is the backend's own, verbatim.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// 2xx answer with `ok: false`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    fn from_reqwest(url: &str, timeout: Duration, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                secs: timeout.as_secs(),
            }
        } else {
            Self::Connection {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    fn rejected(message: Option<String>, fallback: &str) -> Self {
        Self::Rejected {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for the refactoring backend.
pub struct RefactorClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RefactorClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, self.timeout, e))?;
        let value = handle_response(resp, &url, self.timeout).await?;
        serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn connect(
        &self,
        connection_string: &str,
        ttl_seconds: Option<u64>,
    ) -> ClientResult<ConnectResponse> {
        info!(server = %self.base_url, "opening session");
        self.post(
            "session/connect",
            &ConnectRequest {
                connection_string,
                ttl_seconds,
            },
        )
        .await
    }

    pub async fn disconnect(&self, session_id: &str) -> ClientResult<()> {
        info!(server = %self.base_url, "closing session");
        let _: Value = self
            .post("session/disconnect", &DisconnectRequest { session_id })
            .await?;
        Ok(())
    }

    pub async fn analyze_schema(&self, connection: &Connection) -> ClientResult<Vec<TableInfo>> {
        let raw: Value = self
            .post("analyze/schema", &AnalyzeSchemaRequest { connection })
            .await?;
        let tables = normalize_schema(&raw);
        debug!(tables = tables.len(), "schema analyzed");
        Ok(tables)
    }

    /// Generates (and with `apply`, executes) SQL for `ops`.
    pub async fn run_refactor<T: AsRef<Operation>>(
        &self,
        connection: &Connection,
        ops: &[&T],
        apply: bool,
        root_key: &str,
        options: GenerationOptions,
    ) -> ClientResult<RefactorResponse> {
        info!(count = ops.len(), apply, root_key, "running refactor");
        let request = RefactorRequest {
            connection,
            apply,
            root_key,
            use_synonyms: options.use_synonyms,
            use_views: options.use_views,
            cqrs: options.cqrs,
            allow_destructive: options.allow_destructive,
            plan: RefactorPlanDto::new(ops),
        };
        let response: RefactorResponse = self.post("refactor/run", &request).await?;
        if !response.ok {
            return Err(ClientError::rejected(response.message, "Refactor was rejected"));
        }
        Ok(response)
    }

    pub async fn run_cleanup<T: AsRef<Operation>>(
        &self,
        connection: &Connection,
        ops: &[T],
        options: GenerationOptions,
    ) -> ClientResult<CleanupResponse> {
        info!(
            count = ops.len(),
            allow_destructive = options.allow_destructive,
            "running cleanup"
        );
        let request = CleanupRequest {
            connection,
            renames: ops.iter().map(AsRef::as_ref).collect(),
            use_synonyms: options.use_synonyms,
            use_views: options.use_views,
            cqrs: options.cqrs,
            allow_destructive: options.allow_destructive,
        };
        let response: CleanupResponse = self.post("apply/cleanup", &request).await?;
        if !response.ok {
            return Err(ClientError::rejected(response.message, "Cleanup was rejected"));
        }
        Ok(response)
    }

    pub async fn run_codefix<T: AsRef<Operation>>(
        &self,
        ops: &[&T],
        apply: bool,
        root_key: &str,
        include_globs: &[String],
        exclude_globs: &[String],
    ) -> ClientResult<CodeFixResult> {
        info!(count = ops.len(), apply, root_key, "running code fix");
        let request = CodeFixRequest {
            root_key,
            apply,
            plan: RefactorPlanDto::new(ops),
            include_globs,
            exclude_globs,
        };
        let response: CodeFixResponse = self.post("codefix/run", &request).await?;
        if !response.ok {
            return Err(ClientError::rejected(response.message, "Code fix was rejected"));
        }
        Ok(response.result)
    }
}

async fn handle_response(
    resp: reqwest::Response,
    url: &str,
    timeout: Duration,
) -> ClientResult<Value> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ClientError::from_reqwest(url, timeout, e))?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| error_message(&json))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ClientError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// The backend reports failures as `{error}`, `{message}` or problem-details `{title}`.
fn error_message(json: &Value) -> Option<String> {
    ["error", "message", "title"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
