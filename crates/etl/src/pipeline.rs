//! ETL 管道：规范化 -> 去重 -> 地区过滤 -> 增强

use crate::config::PipelineConfig;
use crate::enrichment::DataEnricher;
use crate::normalize::Normalizer;
use crate::observer::{PipelineEvent, ProgressObserver};
use crate::types::{ETLResult, EnrichedJobRecord, NormalizedJobRecord, RawJobRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 单次运行的计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub raw_records: usize,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub enriched_records: usize,
    pub malformed_fields: usize,
}

/// 管道输出
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<EnrichedJobRecord>,
    pub report: PipelineReport,
}

/// 职位数据管道
pub struct JobPipeline {
    normalizer: Normalizer,
    enricher: DataEnricher,
    location_filter: LocationFilter,
}

impl JobPipeline {
    pub fn new(config: &PipelineConfig) -> ETLResult<Self> {
        Ok(Self {
            normalizer: Normalizer::new(),
            enricher: DataEnricher::new(config)?,
            location_filter: LocationFilter::new(&config.location_filter),
        })
    }

    /// 完整流程
    pub fn process(
        &self,
        raw: &[RawJobRecord],
        observer: &dyn ProgressObserver,
    ) -> PipelineOutput {
        observer.notify(&PipelineEvent::Started {
            raw_records: raw.len(),
        });

        let mut malformed_fields = 0;
        let normalized: Vec<NormalizedJobRecord> = raw
            .iter()
            .map(|record| {
                let (job, issues) = self.normalizer.normalize_with_issues(record);
                malformed_fields += issues.len();
                for issue in issues {
                    observer.notify(&PipelineEvent::MalformedField {
                        id: job.id.clone(),
                        field: issue.field,
                        value: issue.value,
                    });
                }
                job
            })
            .collect();
        observer.notify(&PipelineEvent::Normalized {
            records: normalized.len(),
        });

        let mut output = self.process_normalized(normalized, observer);
        output.report.raw_records = raw.len();
        output.report.malformed_fields = malformed_fields;

        observer.notify(&PipelineEvent::Finished(output.report.clone()));
        output
    }

    /// 从已规范化的记录开始（例如从存储中读取的历史数据）
    pub fn process_normalized(
        &self,
        jobs: Vec<NormalizedJobRecord>,
        observer: &dyn ProgressObserver,
    ) -> PipelineOutput {
        let total = jobs.len();
        let unique = dedup_by_id(jobs);
        let duplicates_removed = total - unique.len();
        observer.notify(&PipelineEvent::DuplicatesRemoved {
            removed: duplicates_removed,
            remaining: unique.len(),
        });

        let before = unique.len();
        let kept = self.location_filter.apply(unique);
        let filtered_out = before - kept.len();
        if self.location_filter.is_active() {
            observer.notify(&PipelineEvent::LocationFiltered {
                kept: kept.len(),
                dropped: filtered_out,
            });
        }

        let records = self.enricher.enrich_batch(kept);
        observer.notify(&PipelineEvent::Enriched {
            records: records.len(),
        });

        PipelineOutput {
            report: PipelineReport {
                raw_records: total,
                duplicates_removed,
                filtered_out,
                enriched_records: records.len(),
                malformed_fields: 0,
            },
            records,
        }
    }
}

/// 按 ID 去重，保留首次出现的记录
pub fn dedup_by_id(jobs: Vec<NormalizedJobRecord>) -> Vec<NormalizedJobRecord> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(job.id.clone()))
        .collect()
}

/// 地区二次过滤：地点文本包含任一过滤词即保留
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    terms: Vec<String>,
}

impl LocationFilter {
    pub fn new(terms: &[String]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.terms.is_empty()
    }

    /// 过滤启用时，地点缺失的记录被丢弃
    pub fn matches(&self, job: &NormalizedJobRecord) -> bool {
        if !self.is_active() {
            return true;
        }
        job.location.as_deref().is_some_and(|location| {
            let location = location.to_lowercase();
            self.terms.iter().any(|term| location.contains(term.as_str()))
        })
    }

    pub fn apply(&self, jobs: Vec<NormalizedJobRecord>) -> Vec<NormalizedJobRecord> {
        jobs.into_iter().filter(|job| self.matches(job)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use serde_json::json;
    use std::cell::RefCell;

    fn raw(id: &str, title: &str, location: &str) -> RawJobRecord {
        RawJobRecord::new(json!({
            "id": id,
            "title": title,
            "location": { "display_name": location },
            "created": "2024-05-02T10:00:00Z"
        }))
    }

    fn unfiltered() -> JobPipeline {
        let config = PipelineConfig {
            location_filter: Vec::new(),
            ..PipelineConfig::default()
        };
        JobPipeline::new(&config).unwrap()
    }

    #[test]
    fn test_duplicate_ids_keep_first_seen() {
        let records = vec![
            raw("a", "Senior Java Developer", "Guadalajara, Jalisco"),
            raw("a", "Junior Tester", "Zapopan, Jalisco"),
            raw("b", "DevOps Engineer", "Guadalajara"),
        ];

        let output = unfiltered().process(&records, &NoopObserver);

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].job.title.as_deref(), Some("Senior Java Developer"));
        assert_eq!(output.report.duplicates_removed, 1);
        assert_eq!(output.report.raw_records, 3);
        assert_eq!(output.report.enriched_records, 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let pipeline = unfiltered();
        let records = vec![
            raw("1", "Backend Developer", "Guadalajara"),
            raw("2", "Frontend Developer", "Zapopan"),
            raw("1", "Backend Developer", "Guadalajara"),
        ];

        let first = pipeline.process(&records, &NoopObserver);
        let jobs: Vec<NormalizedJobRecord> =
            first.records.iter().map(|r| r.job.clone()).collect();
        let second = pipeline.process_normalized(jobs, &NoopObserver);

        assert_eq!(second.records, first.records);
        assert_eq!(second.report.duplicates_removed, 0);
    }

    #[test]
    fn test_location_filter() {
        let pipeline = JobPipeline::new(&PipelineConfig::default()).unwrap();
        let records = vec![
            raw("1", "Data Scientist", "Zapopan, Jalisco"),
            raw("2", "Data Scientist", "Monterrey, Nuevo León"),
            RawJobRecord::new(json!({ "id": "3", "title": "No location" })),
            raw("4", "QA", "TONALÁ"),
        ];

        let output = pipeline.process(&records, &NoopObserver);
        let ids: Vec<&str> = output.records.iter().map(|r| r.id()).collect();

        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(output.report.filtered_out, 2);
    }

    #[test]
    fn test_observer_receives_events() {
        let events = RefCell::new(Vec::new());
        let observer = |event: &PipelineEvent| events.borrow_mut().push(event.clone());

        let records = vec![
            RawJobRecord::new(json!({ "id": "1", "salary_min": "n/d" })),
            raw("1", "Duplicate", "Guadalajara"),
        ];
        let output = unfiltered().process(&records, &observer);

        let events = events.into_inner();
        assert_eq!(events.first(), Some(&PipelineEvent::Started { raw_records: 2 }));
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::MalformedField { field: "salary_min", .. }
        )));
        assert_eq!(events.last(), Some(&PipelineEvent::Finished(output.report.clone())));
        assert_eq!(output.report.malformed_fields, 1);
    }

    #[test]
    fn test_empty_input() {
        let output = unfiltered().process(&[], &NoopObserver);
        assert!(output.records.is_empty());
        assert_eq!(output.report, PipelineReport::default());
    }
}
