// ==========================================
// 目录数据交换 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把下层技术错误转换为用户可读的消息
// 红线: 提交失败时只返回一条消息，且保证无任何部分写入
// ==========================================

use crate::engine::reconciliation::ReconcileError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::staging::StagingError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("文件无法读取: {0}")]
    MalformedWorkbook(String),

    #[error("没有可提交的暂存数据 (key={key})，请重新预览")]
    NothingStaged { key: String },

    // ==========================================
    // 提交错误
    // ==========================================
    /// 整批回滚，无部分写入
    #[error("提交失败，未写入任何数据: {0}")]
    CommitFailed(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("暂存失败: {0}")]
    StagingError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    /// 程序配置错误（类型未注册等）
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MalformedWorkbook(msg) => ApiError::MalformedWorkbook(msg),
            ImportError::ConfigurationNotFound { .. } => ApiError::ConfigurationError(err.to_string()),
            ImportError::WorkbookWriteError(msg) => {
                ApiError::InternalError(format!("工作簿生成失败: {}", msg))
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Persistence {
                source: RepositoryError::UniqueConstraintViolation(_),
                ..
            } => ApiError::CommitFailed("文件中存在重复的代码".to_string()),
            ReconcileError::Persistence { source, .. } => {
                ApiError::CommitFailed(ApiError::from(source).to_string())
            }
        }
    }
}

impl From<StagingError> for ApiError {
    fn from(err: StagingError) -> Self {
        ApiError::StagingError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
