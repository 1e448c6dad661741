//! # 配置管理模块
//!
//! 本模块提供 fluxgate 数据面的配置管理功能，包括：
//!
//! - TOML配置文件解析和验证
//! - 环境变量替换和扩展
//! - 配置热重载支持（重载后重新播种共享状态）
//! - 启动期 upstream 引导配置
//!
//! ## 配置结构
//!
//! 主配置包含以下部分：
//! - `server`: 同步通道监听地址、worker 数量、协调间隔
//! - `upstreams`: 控制面首次推送前的后端组引导配置
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use fluxgate::config::Config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file_with_env("config.toml").await?;
//! println!("同步通道监听地址: {}", config.server.bind);
//! # Ok(())
//! # }
//! ```

pub mod manager; // 配置管理器和热重载模块
pub mod server; // 服务器配置模块
pub mod upstreams; // 后端组引导配置模块

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

// Re-export all public types
pub use manager::ConfigManager;
pub use server::ServerConfig;
pub use upstreams::{validate_groups, BackendGroup, Endpoint};

/// fluxgate 主配置结构
///
/// 支持TOML格式序列化和反序列化。`upstreams` 为可选的引导配置，
/// 正常运行时后端组由控制面通过同步通道推送。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// 同步通道与 worker 运行配置
    pub server: ServerConfig,
    /// 启动期后端组引导配置
    #[serde(default)]
    pub upstreams: Vec<BackendGroup>,
}

impl Config {
    /// Load configuration from file with environment variable expansion
    pub async fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;

        // Expand environment variables in the content
        let expanded_content = expand_env_vars(&content);

        let mut config: Config = toml::from_str(&expanded_content)?;

        // Post-process configuration
        config.apply_defaults();
        config.validate()?;

        info!("Configuration loaded from {:?}", path.as_ref());
        Ok(config)
    }

    /// Apply default values where needed
    fn apply_defaults(&mut self) {
        if self.server.workers.is_none() {
            let parallelism = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            self.server.workers = Some(parallelism);
        }

        if self.server.sync_interval.is_none() {
            self.server.sync_interval = Some(1);
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.server.workers {
            if workers == 0 {
                return Err(anyhow::anyhow!("Server workers must be greater than 0"));
            }
        }

        if let Some(sync_interval) = self.server.sync_interval {
            if sync_interval == 0 {
                return Err(anyhow::anyhow!(
                    "Server sync_interval must be greater than 0"
                ));
            }
        }

        if let Some(max_payload_bytes) = self.server.max_payload_bytes {
            if max_payload_bytes == 0 {
                return Err(anyhow::anyhow!(
                    "Server max_payload_bytes must be greater than 0"
                ));
            }
        }

        validate_groups(&self.upstreams)?;

        if self.upstreams.is_empty() {
            warn!("No bootstrap upstreams configured - workers idle until the first push");
        }

        Ok(())
    }

    /// Get effective number of workers
    pub fn get_workers(&self) -> usize {
        self.server.workers.unwrap_or(1)
    }
}

/// Expand environment variables in configuration content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break; // Malformed ${VAR expression
        };

        let var_expr = &result[start + 2..start + end];
        let replacement = match var_expr.split_once(":-") {
            Some((var_name, default_value)) => {
                env::var(var_name).unwrap_or_else(|_| default_value.to_string())
            }
            None => env::var(var_expr).unwrap_or_else(|_| {
                warn!(
                    "Environment variable '{}' not found, using empty string",
                    var_expr
                );
                String::new()
            }),
        };

        result.replace_range(start..start + end + 1, &replacement);
    }

    result
}
