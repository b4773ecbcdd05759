//! 数据增强模块：文本特征 + 日历特征

use crate::config::PipelineConfig;
use crate::features::FeatureExtractor;
use crate::temporal::calendar_fields;
use crate::types::{ETLResult, EnrichedJobRecord, NormalizedJobRecord};

/// 数据增强器
pub struct DataEnricher {
    extractor: FeatureExtractor,
}

impl DataEnricher {
    pub fn new(config: &PipelineConfig) -> ETLResult<Self> {
        Ok(Self {
            extractor: FeatureExtractor::new(config)?,
        })
    }

    /// 增强单条记录
    pub fn enrich(&self, job: NormalizedJobRecord) -> EnrichedJobRecord {
        let features = self.extractor.extract(&job);
        let calendar = calendar_fields(job.created);

        EnrichedJobRecord {
            job,
            features,
            calendar,
        }
    }

    /// 批量增强，保持输入顺序
    pub fn enrich_batch(&self, jobs: Vec<NormalizedJobRecord>) -> Vec<EnrichedJobRecord> {
        jobs.into_iter().map(|job| self.enrich(job)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExperienceLevel;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_data_enrichment() {
        let enricher = DataEnricher::new(&PipelineConfig::default()).unwrap();

        let mut dated = NormalizedJobRecord::with_id("1");
        dated.title = Some("Junior Data Analyst".to_string());
        dated.company = Some("IBM México".to_string());
        dated.created = Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap());

        let undated = NormalizedJobRecord::with_id("2");

        let enriched = enricher.enrich_batch(vec![dated, undated]);

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].id(), "1");
        assert_eq!(enriched[0].features.experience_level, ExperienceLevel::Junior);
        assert!(enriched[0].features.is_big_tech);
        assert_eq!(enriched[0].features.mentioned_tech_keywords, vec!["data analyst"]);
        assert!(enriched[0].is_weekend());
        assert_eq!(enriched[0].calendar.as_ref().map(|c| c.quarter), Some(2));

        assert_eq!(enriched[1].calendar, None);
        assert!(!enriched[1].is_weekend());
    }
}
