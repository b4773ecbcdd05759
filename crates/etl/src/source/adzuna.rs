//! Adzuna 职位搜索 API

use super::{JobSource, SearchQuery};
use crate::types::{ETLError, ETLResult, RawJobRecord};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Adzuna 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdzunaConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
    /// 国家代码，例如 "mx"
    pub country: String,
    pub results_per_page: usize,
    pub requests_per_minute: u32,
    pub request_timeout_secs: u64,
}

impl AdzunaConfig {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            country: "mx".to_string(),
            results_per_page: 50,
            requests_per_minute: 10,
            request_timeout_secs: 30,
        }
    }

    /// 从环境变量 `ADZUNA_APP_ID` / `ADZUNA_API_KEY` 读取凭证
    pub fn from_env() -> ETLResult<Self> {
        let app_id = std::env::var("ADZUNA_APP_ID")
            .map_err(|_| ETLError::InvalidConfig("缺少 ADZUNA_APP_ID".to_string()))?;
        let app_key = std::env::var("ADZUNA_API_KEY")
            .map_err(|_| ETLError::InvalidConfig("缺少 ADZUNA_API_KEY".to_string()))?;

        let mut config = Self::new(app_id, app_key);
        if let Ok(country) = std::env::var("ADZUNA_COUNTRY") {
            config.country = country;
        }
        if let Some(rpm) = std::env::var("MAX_REQUESTS_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.requests_per_minute = rpm;
        }
        Ok(config)
    }
}

pub struct AdzunaSource {
    client: reqwest::Client,
    config: AdzunaConfig,
    rate_limiter: DefaultDirectRateLimiter,
}

impl AdzunaSource {
    pub fn new(config: AdzunaConfig) -> ETLResult<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            ETLError::InvalidConfig("requests_per_minute 必须大于 0".to_string())
        })?;
        if config.results_per_page == 0 {
            return Err(ETLError::InvalidConfig(
                "results_per_page 必须大于 0".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; JobWatch/1.0)")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            config,
        })
    }

    /// `{base}/{country}/search/{page}?app_id=..&app_key=..&results_per_page=..[&what=..][&where=..]`
    pub fn build_search_url(&self, what: &str, location: &str, page: usize) -> ETLResult<Url> {
        let base = format!(
            "{}/{}/search/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.country,
            page
        );

        let mut params = vec![
            ("app_id", self.config.app_id.clone()),
            ("app_key", self.config.app_key.clone()),
            ("results_per_page", self.config.results_per_page.to_string()),
        ];
        if !what.is_empty() {
            params.push(("what", what.to_string()));
        }
        if !location.is_empty() {
            params.push(("where", location.to_string()));
        }

        Url::parse_with_params(&base, &params)
            .map_err(|e| ETLError::InvalidConfig(format!("无效的 URL {}: {}", base, e)))
    }

    async fn fetch_page(&self, url: Url) -> ETLResult<Vec<Value>> {
        // URL 中含有 app_key，错误信息里去掉
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.without_url())?;
        let body: AdzunaResponse = response.json().await.map_err(|e| e.without_url())?;
        Ok(body.results)
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    fn name(&self) -> &str {
        "adzuna"
    }

    async fn search(&self, query: &SearchQuery) -> ETLResult<Vec<RawJobRecord>> {
        let mut jobs = Vec::new();

        for page in 1..=query.max_pages {
            self.rate_limiter.until_ready().await;

            let url = self.build_search_url(&query.what, &query.location, page)?;
            tracing::debug!(
                "Requesting page {} for what='{}' where='{}'",
                page,
                query.what,
                query.location
            );

            let results = match self.fetch_page(url).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!("Request for page {} failed: {}", page, e);
                    continue;
                }
            };

            if results.is_empty() {
                tracing::debug!("No more results at page {}", page);
                break;
            }

            let count = results.len();
            jobs.extend(results.into_iter().map(RawJobRecord::new));

            // 不满一页说明已到最后一页
            if count < self.config.results_per_page {
                break;
            }
        }

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_search_url() {
        let source = AdzunaSource::new(AdzunaConfig::new("id123", "key456")).unwrap();
        let url = source.build_search_url("data scientist", "Guadalajara", 2).unwrap();

        assert_eq!(url.path(), "/v1/api/jobs/mx/search/2");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("app_id".to_string(), "id123".to_string()),
                ("app_key".to_string(), "key456".to_string()),
                ("results_per_page".to_string(), "50".to_string()),
                ("what".to_string(), "data scientist".to_string()),
                ("where".to_string(), "Guadalajara".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_terms_are_omitted() {
        let source = AdzunaSource::new(AdzunaConfig::new("id", "key")).unwrap();
        let url = source.build_search_url("", "", 1).unwrap();

        assert!(url.query_pairs().all(|(k, _)| k != "what" && k != "where"));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut config = AdzunaConfig::new("id", "key");
        config.requests_per_minute = 0;

        assert!(matches!(
            AdzunaSource::new(config),
            Err(ETLError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_response_without_results() {
        let response: AdzunaResponse = serde_json::from_str(r#"{ "count": 0 }"#).unwrap();
        assert!(response.results.is_empty());
    }
}
