//! # Analytics
//!
//! 职位数据的统计与建模准备
//!
//! ## 主要模块
//!
//! - `summary`: 数据集汇总与分布统计
//! - `timeseries`: 按日/周/月重采样
//! - `preprocessing`: 类别编码、缺失值填充、标准化
//! - `tabular`: 表格化输出

pub mod preprocessing;
pub mod summary;
pub mod tabular;
pub mod timeseries;
pub mod types;

pub use preprocessing::{prepare, LabelEncoder, PreparationConfig, PreparedDataset, Scaler};
pub use summary::{breakdown, summarize, Breakdown, DatasetSummary, DateRange};
pub use tabular::Table;
pub use timeseries::{resample, Frequency, TimeSeriesPoint};
pub use types::{AnalyticsError, AnalyticsResult};
