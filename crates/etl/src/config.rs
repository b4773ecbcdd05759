//! 管道配置

use crate::types::{ETLError, ETLResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 技术匹配模式（名称 -> 正则表达式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechPattern {
    /// 输出列名为 `mentions_<name>`
    pub name: String,
    pub pattern: String,
}

impl TechPattern {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// 增强管道配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 追踪的大型科技公司（子串匹配，不区分大小写）
    pub big_tech_companies: Vec<String>,
    /// 技术模式表
    pub tech_patterns: Vec<TechPattern>,
    /// 技术关键词表（字面子串匹配）
    pub tech_keywords: Vec<String>,
    /// 地区二次过滤词，为空时不过滤
    pub location_filter: Vec<String>,
}

impl PipelineConfig {
    /// 从 JSON 文件加载，缺失的字段使用默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> ETLResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ETLError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    /// 技术名称列表，顺序与模式表一致
    pub fn tech_names(&self) -> Vec<String> {
        self.tech_patterns.iter().map(|p| p.name.clone()).collect()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            big_tech_companies: to_strings(&[
                "Oracle", "Intel", "IBM", "Microsoft", "Google", "Amazon", "Apple", "Meta",
                "Facebook", "Salesforce", "Adobe", "SAP", "Dell", "HP", "Cisco", "VMware",
                "NVIDIA", "Qualcomm", "Tesla", "Netflix", "Uber", "Airbnb", "Twitter",
                "LinkedIn", "PayPal", "eBay", "Zoom", "Dropbox", "Slack", "Spotify", "TikTok",
                "ByteDance",
            ]),
            tech_patterns: vec![
                TechPattern::new("python", r"\bpython\b"),
                TechPattern::new("java", r"\bjava\b"),
                TechPattern::new("javascript", r"\b(javascript|js)\b"),
                TechPattern::new("react", r"\breact\b"),
                TechPattern::new("angular", r"\bangular\b"),
                TechPattern::new("node", r"\b(node\.js|nodejs)\b"),
                TechPattern::new("sql", r"\b(sql|mysql|postgresql|oracle)\b"),
                TechPattern::new("cloud", r"\b(aws|azure|gcp|cloud)\b"),
                TechPattern::new(
                    "machine_learning",
                    r"\b(machine learning|ml|ai|artificial intelligence)\b",
                ),
                TechPattern::new("docker", r"\bdocker\b"),
                TechPattern::new("kubernetes", r"\bkubernetes\b"),
                TechPattern::new("agile", r"\b(agile|scrum|kanban)\b"),
            ],
            tech_keywords: to_strings(&[
                "software engineer", "data scientist", "machine learning",
                "artificial intelligence", "cloud engineer", "devops", "full stack", "backend",
                "frontend", "mobile developer", "cybersecurity", "data analyst",
                "product manager", "scrum master", "technical lead", "system administrator",
                "network engineer", "database administrator", "ui/ux designer",
                "quality assurance", "python developer", "java developer",
                "javascript developer", "react developer", "angular developer",
                "node.js developer", "blockchain developer",
            ]),
            location_filter: to_strings(&[
                "guadalajara", "zapopan", "jalisco", "tlaquepaque", "tonalá", "tlajomulco",
            ]),
        }
    }
}

pub(crate) fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "location_filter": [] }"#).unwrap();

        assert!(config.location_filter.is_empty());
        assert_eq!(config.tech_patterns.len(), 12);
        assert!(config.big_tech_companies.iter().any(|c| c == "Microsoft"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PipelineConfig::from_json_file("/nonexistent/pipeline.json").unwrap_err();
        assert!(matches!(err, ETLError::Io(_)));
    }
}
