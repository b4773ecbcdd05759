//! 核心类型定义

use etl::ETLError;
use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("无效的配置: {0}")]
    InvalidConfig(String),

    #[error("数据预处理错误: {0}")]
    Preprocessing(String),

    #[error("未知的重采样频率: {0}")]
    UnknownFrequency(String),

    #[error("未知的字段: {0}")]
    UnknownField(String),

    #[error("数据维度不匹配: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("ETL 错误: {0}")]
    Etl(#[from] ETLError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}
