//! # ChemCloud HTTP 客户端
//!
//! 通过 ChemCloud v2 REST API 提交计算并轮询结果。
//!
//! ## 接口
//! - `POST /api/v2/oauth/token`：OAuth2 password / refresh_token 授权
//! - `POST /api/v2/compute?program=...`：提交一批输入，返回任务 ID
//! - `GET  /api/v2/compute/output/{task_id}`：查询任务状态与输出
//!
//! ## 依赖关系
//! - 实现 `client/mod.rs` 中的 `ComputeBackend`
//! - 使用 `reqwest` 阻塞客户端

use super::{ComputeBackend, SubmitOptions, TaskStatus};
use crate::error::{QcpipeError, Result};
use crate::models::{InputData, ProgramOutput};

use reqwest::blocking::{Client, Response};
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_DOMAIN: &str = "https://chemcloud.mtzlab.com";

const API_PREFIX: &str = "/api/v2";
const TOKEN_SCOPE: &str = "compute:public compute:private offline_access";

/// 提前刷新令牌的余量
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// ChemCloud 连接设置
#[derive(Debug, Clone)]
pub struct ChemCloudSettings {
    pub domain: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// 单个 HTTP 请求的超时
    pub request_timeout: Duration,
}

impl Default for ChemCloudSettings {
    fn default() -> Self {
        ChemCloudSettings {
            domain: DEFAULT_DOMAIN.to_string(),
            username: None,
            password: None,
            access_token: None,
            refresh_token: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OutputResponse {
    status: String,
    #[serde(default)]
    program_output: Option<Value>,
}

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<Instant>,
}

impl Session {
    fn is_valid(&self) -> bool {
        self.expires_at
            .map_or(true, |t| Instant::now() + EXPIRY_MARGIN < t)
    }
}

/// ChemCloud 客户端
#[derive(Debug)]
pub struct ChemCloudClient {
    http: Client,
    settings: ChemCloudSettings,
    session: Mutex<Option<Session>>,
}

impl ChemCloudClient {
    pub fn new(settings: ChemCloudSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        let session = settings.access_token.clone().map(|access_token| Session {
            access_token,
            refresh_token: settings.refresh_token.clone(),
            expires_at: None,
        });

        Ok(ChemCloudClient {
            http,
            settings,
            session: Mutex::new(session),
        })
    }

    pub fn domain(&self) -> &str {
        &self.settings.domain
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.settings.domain.trim_end_matches('/'),
            API_PREFIX,
            path
        )
    }

    /// 返回有效的访问令牌，必要时刷新或重新登录
    fn bearer_token(&self) -> Result<String> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| QcpipeError::Other("ChemCloud session lock poisoned".to_string()))?;

        if let Some(current) = session.as_ref().filter(|s| s.is_valid()) {
            return Ok(current.access_token.clone());
        }

        let refresh_token = session
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .or_else(|| self.settings.refresh_token.clone());

        let fresh = match refresh_token {
            Some(token) => {
                debug!("refreshing ChemCloud access token");
                match self.request_token(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", token.as_str()),
                ]) {
                    Ok(fresh) => fresh,
                    Err(e) => {
                        warn!("token refresh failed ({}), falling back to password login", e);
                        self.password_login()?
                    }
                }
            }
            None => self.password_login()?,
        };

        let token = fresh.access_token.clone();
        *session = Some(fresh);
        Ok(token)
    }

    fn password_login(&self) -> Result<Session> {
        match (&self.settings.username, &self.settings.password) {
            (Some(username), Some(password)) => {
                debug!(username = username.as_str(), "requesting ChemCloud access token");
                self.request_token(&[
                    ("grant_type", "password"),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                    ("scope", TOKEN_SCOPE),
                ])
            }
            _ => Err(QcpipeError::AuthError(
                "No ChemCloud credentials; set CHEMCLOUD_USERNAME and CHEMCLOUD_PASSWORD \
                 or CHEMCLOUD_ACCESS_TOKEN"
                    .to_string(),
            )),
        }
    }

    fn request_token(&self, form: &[(&str, &str)]) -> Result<Session> {
        let response = self
            .http
            .post(self.api_url("/oauth/token"))
            .form(form)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(QcpipeError::AuthError(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json()?;
        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }
}

impl ComputeBackend for ChemCloudClient {
    fn submit(
        &self,
        program: &str,
        inputs: &[InputData],
        options: &SubmitOptions,
    ) -> Result<String> {
        let token = self.bearer_token()?;
        debug!(program, count = inputs.len(), "submitting batch to ChemCloud");

        let query = [
            ("program", program.to_string()),
            ("collect_stdout", options.collect_stdout.to_string()),
            ("collect_files", options.collect_files.to_string()),
            ("collect_wfns", options.collect_wfns.to_string()),
        ];

        let response = self
            .http
            .post(self.api_url("/compute"))
            .bearer_auth(token)
            .query(&query)
            .json(inputs)
            .send()?;

        let body: Value = check_status(response)?.json()?;
        parse_task_id(&body)
    }

    fn poll(&self, task_id: &str) -> Result<TaskStatus> {
        let token = self.bearer_token()?;

        let response = self
            .http
            .get(self.api_url(&format!("/compute/output/{}", task_id)))
            .bearer_auth(token)
            .send()?;

        let body: OutputResponse = check_status(response)?.json()?;
        debug!(task_id, status = body.status.as_str(), "polled ChemCloud task");
        parse_status(task_id, body)
    }
}

/// 非 2xx 响应转换为 `ApiError`
fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(QcpipeError::ApiError { status, body })
}

/// 任务 ID 可能是裸字符串或 `{"task_id": ...}`
fn parse_task_id(body: &Value) -> Result<String> {
    match body {
        Value::String(id) => Ok(id.clone()),
        Value::Object(map) => map
            .get("task_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| QcpipeError::Other(format!("No task_id in response: {}", body))),
        other => Err(QcpipeError::Other(format!(
            "Unexpected submission response: {}",
            other
        ))),
    }
}

fn parse_status(task_id: &str, response: OutputResponse) -> Result<TaskStatus> {
    let status = response.status.to_uppercase();
    match status.as_str() {
        "PENDING" | "RECEIVED" | "RETRY" => Ok(TaskStatus::Pending),
        "STARTED" => Ok(TaskStatus::Running),
        "SUCCESS" => {
            let items = match response.program_output {
                Some(Value::Array(items)) if !items.is_empty() => items,
                Some(Value::Array(_)) | Some(Value::Null) | None => {
                    return Err(QcpipeError::ResponseError {
                        context: format!("task {}", task_id),
                        source: serde_json::Error::custom("SUCCESS without program_output"),
                    })
                }
                Some(single) => vec![single],
            };
            let outputs = items
                .into_iter()
                .map(serde_json::from_value::<ProgramOutput>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| QcpipeError::ResponseError {
                    context: format!("task {}", task_id),
                    source: e,
                })?;
            Ok(TaskStatus::Complete(outputs))
        }
        "FAILURE" | "REVOKED" => {
            let reason = response
                .program_output
                .as_ref()
                .and_then(|o| o.get("traceback").or_else(|| o.get("error")))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("task status {}", status));
            Ok(TaskStatus::Failed(reason))
        }
        other => Err(QcpipeError::Other(format!(
            "Unknown status '{}' for task {}",
            other, task_id
        ))),
    }
}
