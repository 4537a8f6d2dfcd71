//! 连接注册服务模块

use reqwest::StatusCode;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::{CreateDatabaseRequest, DatabaseSearchQuery, DatabaseSearchResponse};
use common::utils::redact_uri;

use crate::session::SupersetSession;

/// 注册流程的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// 同名连接已存在，未做任何修改
    AlreadyExists,
    /// 连接记录已创建
    Created,
}

/// 数据库连接注册服务
pub struct RegistrationService {
    session: SupersetSession,
}

impl RegistrationService {
    /// 创建新的注册服务实例
    pub fn new(session: SupersetSession) -> Self {
        Self { session }
    }

    /// 确保目标连接在 Superset 中存在（幂等）。
    ///
    /// 先按名称精确查询；命中则直接返回，未命中才发起创建。
    /// 查询与创建之间没有事务保护，并发执行时以远端自身的
    /// 唯一性约束为准。
    pub async fn ensure_database(
        &self,
        request: CreateDatabaseRequest,
    ) -> AppResult<RegistrationOutcome> {
        request.validate()?;

        if self.database_exists(&request.database_name).await? {
            tracing::info!(name = %request.database_name, "连接已存在，无需操作");
            return Ok(RegistrationOutcome::AlreadyExists);
        }

        self.create_database(&request).await?;
        Ok(RegistrationOutcome::Created)
    }

    /// 按名称精确查询连接是否已注册。
    async fn database_exists(&self, name: &str) -> AppResult<bool> {
        let query = DatabaseSearchQuery::by_name(name).to_query_value()?;
        let response = self
            .session
            .get(&self.session.database_endpoint())
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            // 查询失败不阻断流程，按"未找到"继续创建
            tracing::warn!(status = status.as_u16(), "连接查询失败，继续尝试创建");
            return Ok(false);
        }

        match response.json::<DatabaseSearchResponse>().await {
            Ok(result) => Ok(result.count > 0),
            Err(e) => {
                tracing::warn!(error = %e, "连接查询响应无法解析，继续尝试创建");
                Ok(false)
            }
        }
    }

    /// 创建连接记录；只有 201 视为成功。
    async fn create_database(&self, request: &CreateDatabaseRequest) -> AppResult<()> {
        let response = self
            .session
            .post(&self.session.database_endpoint())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::CREATED {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            name = %request.database_name,
            uri = %redact_uri(&request.sqlalchemy_uri),
            "数据库连接已注册"
        );
        Ok(())
    }
}
