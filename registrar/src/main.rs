//! Superset 数据库连接注册工具
//!
//! 一次性引导程序，提供以下功能：
//! - 登录 Superset 并获取 CSRF 令牌
//! - 按名称检查目标连接是否已注册（幂等门槛）
//! - 缺失时创建连接记录

use common::config::AppConfig;
use registrar::service::RegistrationOutcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置（缺失必填项时在任何网络调用之前退出）
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match registrar::run(&config).await {
        Ok(RegistrationOutcome::AlreadyExists) => {
            println!("Database connection already exists. No action needed.");
        }
        Ok(RegistrationOutcome::Created) => {
            println!("Database connection added successfully.");
        }
        Err(e) => {
            tracing::error!(error = %e, "注册失败");
            eprintln!("Failed to register database connection: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
