//! 数据接入错误类型

use std::path::PathBuf;

use thiserror::Error;

/// 数据接入错误
///
/// 格式错误的语句不算错误：它们被跳过，并计入
/// [`IndexStats`](crate::IndexStats)。
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 源日志无法读取
    #[error("cannot read sentence log '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置中的区间不可用
    #[error(transparent)]
    Interval(#[from] contracts::ContractError),
}

/// 数据接入 Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
