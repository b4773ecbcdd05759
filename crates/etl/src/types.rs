//! 核心类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type ETLResult<T> = Result<T, ETLError>;

#[derive(Debug, Error)]
pub enum ETLError {
    #[error("HTTP 请求失败: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("JSON 解析失败: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("数据源错误: {0}")]
    DataSource(String),

    #[error("无效的配置: {0}")]
    InvalidConfig(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 原始职位记录（数据源返回的 JSON，任何字段都可能缺失或格式错误）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawJobRecord(pub Value);

impl RawJobRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// 按路径读取嵌套字段，例如 `["company", "display_name"]`
    pub fn field(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.0, |node, key| node.get(*key))
            .filter(|v| !v.is_null())
    }

    /// 用于日志的记录标识
    pub fn display_id(&self) -> String {
        match self.field(&["id"]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "N/A".to_string(),
        }
    }
}

impl From<Value> for RawJobRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 规范化后的职位记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJobRecord {
    /// 数据源内唯一，用于去重
    pub id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// 行政区划（`location.area` 拼接）
    pub area: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// 仅当上下限都存在时才有值
    pub salary_avg: Option<f64>,
    /// 薪资是否为数据源估算
    pub salary_is_predicted: bool,
    pub created: Option<DateTime<Utc>>,
    pub redirect_url: Option<String>,
    pub category: Option<String>,
    pub contract_type: Option<String>,
    pub contract_time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NormalizedJobRecord {
    /// 空记录，仅有 ID
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            company: None,
            location: None,
            area: None,
            description: None,
            salary_min: None,
            salary_max: None,
            salary_avg: None,
            salary_is_predicted: false,
            created: None,
            redirect_url: None,
            category: None,
            contract_type: None,
            contract_time: None,
            latitude: None,
            longitude: None,
        }
    }

    /// 标题 + 描述，小写，缺失按空串处理
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

/// 经验等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Senior,
    Junior,
    Mid,
    Unspecified,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Unspecified => "Unspecified",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从文本中提取的特征
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFeatures {
    pub is_big_tech: bool,
    pub experience_level: ExperienceLevel,
    pub is_senior: bool,
    pub is_junior: bool,
    pub is_mid: bool,
    pub is_remote: bool,
    pub is_hybrid: bool,
    pub is_onsite: bool,
    /// 技术提及，顺序与配置的模式表一致
    pub tech_mentions: Vec<(String, bool)>,
    /// 命中的技术关键词，顺序与关键词表一致
    pub mentioned_tech_keywords: Vec<String>,
    pub tech_keywords_count: usize,
}

impl JobFeatures {
    pub fn mentions(&self, tech: &str) -> bool {
        self.tech_mentions
            .iter()
            .any(|(name, hit)| *hit && name == tech)
    }
}

/// 日历特征（要么全部存在，要么全部缺失）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 0 = 周一 … 6 = 周日
    pub day_of_week: u32,
    /// ISO 周数
    pub week_of_year: u32,
    pub quarter: u32,
    pub day_name: String,
    pub month_name: String,
    pub is_weekend: bool,
    pub is_month_start: bool,
    pub is_month_end: bool,
}

/// 增强后的职位记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedJobRecord {
    pub job: NormalizedJobRecord,
    pub features: JobFeatures,
    pub calendar: Option<CalendarFields>,
}

impl EnrichedJobRecord {
    pub fn id(&self) -> &str {
        &self.job.id
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.job.created
    }

    pub fn is_weekend(&self) -> bool {
        self.calendar.as_ref().is_some_and(|c| c.is_weekend)
    }
}
