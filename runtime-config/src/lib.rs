//! Superset 运行时配置库
//!
//! 由宿主仪表盘应用在自身启动时加载，提供以下功能：
//! - 根据环境变量组装的 SQLAlchemy 数据库连接 URI
//! - 绑定 Redis 计数存储的请求限流策略
//! - 将限流器挂载到宿主路由的注册函数
//!
//! 本库自身不发起任何网络调用；Redis 连接由限流器在首次
//! 处理请求时惰性建立。

pub mod rate_limit;
pub mod settings;

pub use rate_limit::{KeyStrategy, Quota, RateLimitPolicy};
pub use settings::RuntimeSettings;
