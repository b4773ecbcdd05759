//! 职位数据源模块

pub mod adzuna;

use crate::config::{to_strings, PipelineConfig};
use crate::types::{ETLResult, RawJobRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 搜索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// 关键词或公司名
    pub what: String,
    /// 地点
    pub location: String,
    pub max_pages: usize,
}

impl SearchQuery {
    pub fn new(what: &str, location: &str, max_pages: usize) -> Self {
        Self {
            what: what.to_string(),
            location: location.to_string(),
            max_pages,
        }
    }
}

/// 职位数据源接口
#[async_trait]
pub trait JobSource: Send + Sync {
    /// 数据源名称
    fn name(&self) -> &str;

    /// 搜索职位，返回原始记录
    async fn search(&self, query: &SearchQuery) -> ETLResult<Vec<RawJobRecord>>;
}

/// 抓取计划：按公司、按技术关键词、按通用词三种策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestPlan {
    pub locations: Vec<String>,
    pub companies: Vec<String>,
    pub company_limit: usize,
    pub company_location_limit: usize,
    pub company_pages: usize,
    pub keywords: Vec<String>,
    pub keyword_limit: usize,
    pub keyword_location_limit: usize,
    pub keyword_pages: usize,
    pub general_terms: Vec<String>,
    pub general_pages: usize,
}

impl HarvestPlan {
    /// 使用管道配置中的公司和关键词表
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            locations: to_strings(&[
                "Guadalajara", "Zapopan", "Tlaquepaque", "Tonalá", "Tlajomulco", "El Salto",
                "Puerto Vallarta", "Jalisco",
            ]),
            companies: config.big_tech_companies.clone(),
            company_limit: 10,
            company_location_limit: 3,
            company_pages: 2,
            keywords: config.tech_keywords.clone(),
            keyword_limit: 15,
            keyword_location_limit: 2,
            keyword_pages: 2,
            general_terms: to_strings(&["software", "technology", "IT", "developer", "engineer"]),
            general_pages: 3,
        }
    }

    /// 展开为搜索条件列表
    pub fn queries(&self) -> Vec<SearchQuery> {
        let mut queries = Vec::new();

        let company_locations: Vec<&String> =
            self.locations.iter().take(self.company_location_limit).collect();
        let keyword_locations: Vec<&String> =
            self.locations.iter().take(self.keyword_location_limit).collect();

        for company in self.companies.iter().take(self.company_limit) {
            for location in &company_locations {
                queries.push(SearchQuery::new(company, location, self.company_pages));
            }
        }

        for keyword in self.keywords.iter().take(self.keyword_limit) {
            for location in &keyword_locations {
                queries.push(SearchQuery::new(keyword, location, self.keyword_pages));
            }
        }

        for term in &self.general_terms {
            for location in &keyword_locations {
                queries.push(SearchQuery::new(term, location, self.general_pages));
            }
        }

        queries
    }
}

impl Default for HarvestPlan {
    fn default() -> Self {
        Self::from_pipeline(&PipelineConfig::default())
    }
}

/// 执行抓取计划，单个查询失败时记录日志并继续
pub async fn harvest(source: &dyn JobSource, plan: &HarvestPlan) -> Vec<RawJobRecord> {
    let queries = plan.queries();
    tracing::info!("Running {} searches against {}", queries.len(), source.name());

    let mut all_jobs = Vec::new();
    for query in &queries {
        match source.search(query).await {
            Ok(jobs) => {
                tracing::info!(
                    "Search what='{}' where='{}': {} jobs",
                    query.what,
                    query.location,
                    jobs.len()
                );
                all_jobs.extend(jobs);
            }
            Err(e) => {
                tracing::warn!(
                    "Search what='{}' where='{}' failed: {}",
                    query.what,
                    query.location,
                    e
                );
            }
        }
    }

    tracing::info!("Harvest complete: {} raw jobs", all_jobs.len());
    all_jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ETLError;
    use serde_json::json;

    struct StaticSource;

    #[async_trait]
    impl JobSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, query: &SearchQuery) -> ETLResult<Vec<RawJobRecord>> {
            if query.what == "broken" {
                return Err(ETLError::DataSource("unavailable".to_string()));
            }
            Ok(vec![RawJobRecord::new(json!({
                "id": format!("{}-{}", query.what, query.location),
                "title": query.what,
            }))])
        }
    }

    fn small_plan() -> HarvestPlan {
        HarvestPlan {
            locations: to_strings(&["Guadalajara", "Zapopan", "Tonalá"]),
            companies: to_strings(&["Oracle", "Intel", "IBM"]),
            company_limit: 2,
            company_location_limit: 3,
            company_pages: 2,
            keywords: to_strings(&["devops", "broken"]),
            keyword_limit: 5,
            keyword_location_limit: 1,
            keyword_pages: 2,
            general_terms: to_strings(&["software"]),
            general_pages: 3,
        }
    }

    #[test]
    fn test_plan_expansion() {
        let queries = small_plan().queries();

        assert_eq!(queries.len(), 2 * 3 + 2 + 1);
        assert_eq!(queries[0], SearchQuery::new("Oracle", "Guadalajara", 2));
        assert_eq!(queries[5], SearchQuery::new("Intel", "Tonalá", 2));
        assert_eq!(queries[6], SearchQuery::new("devops", "Guadalajara", 2));
        assert_eq!(queries[8], SearchQuery::new("software", "Guadalajara", 3));
    }

    #[test]
    fn test_default_plan_follows_pipeline_lists() {
        let plan = HarvestPlan::default();
        let queries = plan.queries();

        assert_eq!(queries.len(), 10 * 3 + 15 * 2 + 5 * 2);
        assert_eq!(queries[0].what, "Oracle");
    }

    #[tokio::test]
    async fn test_harvest_skips_failed_queries() {
        let jobs = harvest(&StaticSource, &small_plan()).await;

        // 9 个查询中 "broken" 失败
        assert_eq!(jobs.len(), 8);
        assert_eq!(jobs[0].display_id(), "Oracle-Guadalajara");
    }
}
