//! # 远程服务连接参数
//!
//! 各子命令共用的 ChemCloud 连接与轮询参数，可由环境变量提供。
//!
//! ## 依赖关系
//! - 被 `cli/run.rs`, `cli/fetch.rs`, `cli/files.rs` 使用
//! - 转换为 `client::ChemCloudSettings` 和 `pipeline::PollSettings`

use crate::client::chemcloud::DEFAULT_DOMAIN;
use crate::client::ChemCloudSettings;
use crate::pipeline::PollSettings;

use clap::Args;
use std::time::Duration;

/// ChemCloud 连接参数
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// ChemCloud server URL
    #[arg(long, env = "CHEMCLOUD_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,

    /// Account username (password login)
    #[arg(long, env = "CHEMCLOUD_USERNAME")]
    pub username: Option<String>,

    /// Account password (password login)
    #[arg(long, env = "CHEMCLOUD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Pre-issued access token
    #[arg(long, env = "CHEMCLOUD_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Refresh token used to obtain new access tokens
    #[arg(long, env = "CHEMCLOUD_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    // ─────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────
    /// Seconds between status checks
    #[arg(long, default_value_t = 1.0)]
    pub poll_interval: f64,

    /// Give up waiting after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Timeout for a single HTTP request in seconds
    #[arg(long, default_value_t = 60)]
    pub request_timeout: u64,
}

impl ClientArgs {
    pub fn settings(&self) -> ChemCloudSettings {
        ChemCloudSettings {
            domain: self.domain.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs_f64(self.poll_interval.max(0.0)),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}
