// ==========================================
// 目录数据交换 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级错误（映射/结构校验/业务校验）不走此类型，
//       而是以字符串累积到 ImportResult.errors
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（致命，整个导入中止）=====
    #[error("工作簿格式错误: {0}")]
    MalformedWorkbook(String),

    #[error("工作簿生成失败: {0}")]
    WorkbookWriteError(String),

    // ===== 配置错误（程序错误，不可由用户输入触发）=====
    #[error("未注册的配置: {kind} for {type_name}")]
    ConfigurationNotFound {
        kind: &'static str,
        type_name: &'static str,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::MalformedWorkbook(err.to_string())
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ImportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportError::WorkbookWriteError(err.to_string())
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::WorkbookWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ImportError>;
