//! 时间序列重采样模块

use crate::summary::{mean, percentage};
use crate::types::{AnalyticsError, AnalyticsResult};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use etl::EnrichedJobRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 重采样频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    /// ISO 周，周一开始，以周一标记
    Weekly,
    /// 以每月 1 日标记
    Monthly,
}

impl Frequency {
    /// 用于输出文件名
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// 时间点所在桶的起始日期
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Frequency::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// 下一个桶的起始日期
    pub fn next_bucket(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => start.succ_opt(),
            Frequency::Weekly => start.checked_add_days(Days::new(7)),
            Frequency::Monthly => start.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for Frequency {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "daily" => Ok(Frequency::Daily),
            "w" | "weekly" => Ok(Frequency::Weekly),
            "m" | "ms" | "monthly" => Ok(Frequency::Monthly),
            _ => Err(AnalyticsError::UnknownFrequency(s.to_string())),
        }
    }
}

/// 解析频率列表，重复项只保留一次
pub fn parse_frequencies(tokens: &[String]) -> AnalyticsResult<Vec<Frequency>> {
    let mut frequencies = Vec::new();
    for token in tokens {
        let frequency: Frequency = token.parse()?;
        if !frequencies.contains(&frequency) {
            frequencies.push(frequency);
        }
    }
    Ok(frequencies)
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 单个时间桶的聚合结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub bucket_start: NaiveDate,
    pub job_count: usize,
    pub big_tech_count: usize,
    /// 桶内无记录时为 0
    pub big_tech_percentage: f64,
    /// 桶内 `salary_avg` 的均值，无数据时为 0
    pub avg_salary: f64,
    pub avg_tech_keywords: f64,
    /// 截至本桶的累计职位数
    pub cumulative_jobs: usize,
}

#[derive(Default)]
struct Bucket {
    job_count: usize,
    big_tech_count: usize,
    salaries: Vec<f64>,
    keyword_counts: Vec<f64>,
}

/// 按频率重采样
///
/// 没有发布时间的记录被排除；观测范围内的空桶以 0 值出现。
pub fn resample(records: &[EnrichedJobRecord], frequency: Frequency) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for record in records {
        let Some(created) = record.created() else {
            continue;
        };
        let bucket = buckets.entry(frequency.bucket_start(created)).or_default();
        bucket.job_count += 1;
        if record.features.is_big_tech {
            bucket.big_tech_count += 1;
        }
        if let Some(salary) = record.job.salary_avg {
            bucket.salaries.push(salary);
        }
        bucket
            .keyword_counts
            .push(record.features.tech_keywords_count as f64);
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let empty = Bucket::default();
    let mut points = Vec::new();
    let mut cumulative_jobs = 0;
    let mut current = Some(first);

    while let Some(start) = current.filter(|d| *d <= last) {
        let bucket = buckets.get(&start).unwrap_or(&empty);
        cumulative_jobs += bucket.job_count;

        points.push(TimeSeriesPoint {
            bucket_start: start,
            job_count: bucket.job_count,
            big_tech_count: bucket.big_tech_count,
            big_tech_percentage: percentage(bucket.big_tech_count, bucket.job_count),
            avg_salary: mean(&bucket.salaries).unwrap_or(0.0),
            avg_tech_keywords: mean(&bucket.keyword_counts).unwrap_or(0.0),
            cumulative_jobs,
        });

        current = frequency.next_bucket(start);
    }

    points
}
