//! Superset 数据库连接注册库
//!
//! 提供一次性的幂等注册流程：登录 Superset、获取 CSRF 令牌、
//! 检查目标连接是否已存在、缺失时创建连接记录。

pub mod service;
pub mod session;

use std::time::Duration;

use common::config::AppConfig;
use common::errors::AppResult;
use common::models::CreateDatabaseRequest;

use service::{RegistrationOutcome, RegistrationService};
use session::SupersetSession;

/// 请求超时时间（秒）
const HTTP_TIMEOUT_SECS: u64 = 30;

/// 执行完整的注册流程。
///
/// 登录、获取 CSRF 令牌、检查并按需创建连接记录；每一步的
/// 失败都会立即中止并带回上游响应体。
pub async fn run(config: &AppConfig) -> AppResult<RegistrationOutcome> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let session = SupersetSession::establish(client, config.superset.clone()).await?;

    let request = CreateDatabaseRequest::new(
        config.postgres.db_name.clone(),
        config.postgres.sqlalchemy_uri(),
    );

    let service = RegistrationService::new(session);
    service.ensure_database(request).await
}
