use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("IO 错误: {0}")]
    Io(Arc<std::io::Error>),

    #[error("CSV 读取错误: {0}")]
    Csv(Arc<csv::Error>),

    #[error("数据文件缺少必需的列: '{0}'")]
    MissingColumn(String),

    #[error("数据文件没有表头行")]
    EmptyHeader,

    #[error("配置文件错误: {0}")]
    Config(Arc<ini::Error>),

    #[error("错误: {0}")]
    Custom(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(Arc::new(err))
    }
}

impl From<ini::Error> for AppError {
    fn from(err: ini::Error) -> Self {
        Self::Config(Arc::new(err))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
