//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义数据与激活层的所有错误类型。
//! 权限不足与存储不可用是两类需要区分上报的失败：前者
//! 提示用户提权后重试，后者是暂时性 I/O 问题。

use std::path::PathBuf;
use thiserror::Error;

/// 数据与激活层的统一错误类型
#[derive(Error, Debug)]
pub enum DataError {
    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化错误
    #[error("JSON 序列化错误: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// 资源未找到
    #[error("未找到资源: {0}")]
    NotFound(String),

    /// 权限不足，需要以管理员身份运行
    #[error("权限不足: {0}")]
    PermissionDenied(String),

    /// 持久存储不可用（暂时性故障，可重试）
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    /// 并发错误
    #[error("并发错误: {0}")]
    Concurrency(String),
}

/// 便于与现有代码集成的类型别名
pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 将存储读写的 I/O 错误归类
    ///
    /// 权限错误映射为 `PermissionDenied`，其余归为 `StoreUnavailable`。
    pub fn from_store_io(source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(source.to_string())
        } else {
            Self::StoreUnavailable(source.to_string())
        }
    }

    /// 是否为需要提权的权限错误
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
