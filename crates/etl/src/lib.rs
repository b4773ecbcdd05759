//! # ETL - Extract, Transform, Load
//!
//! 招聘职位数据的 ETL 管道
//!
//! ## 功能
//!
//! - 从职位搜索 API 抓取数据（限流、分页）
//! - 规范化原始记录，容忍缺失和格式错误的字段
//! - 去重与地区过滤
//! - 文本特征提取（大厂、经验等级、工作方式、技术栈）
//! - 日历特征
//! - SQLite 持久化

pub mod config;
pub mod enrichment;
pub mod features;
pub mod normalize;
pub mod observer;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod temporal;
pub mod types;

pub use config::{PipelineConfig, TechPattern};
pub use enrichment::DataEnricher;
pub use features::FeatureExtractor;
pub use normalize::{MalformedField, Normalizer};
pub use observer::{NoopObserver, PipelineEvent, ProgressObserver, TracingObserver};
pub use pipeline::{JobPipeline, PipelineOutput, PipelineReport};
pub use source::{harvest, HarvestPlan, JobSource, SearchQuery};
pub use storage::{JobStore, StoreStats};
pub use types::{
    CalendarFields, ETLError, ETLResult, EnrichedJobRecord, ExperienceLevel, JobFeatures,
    NormalizedJobRecord, RawJobRecord,
};
