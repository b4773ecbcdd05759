//! 数据集统计
//!
//! 空输入或字段全部缺失时，计数、百分比和均值均为 0，日期范围为 `None`。

use chrono::{DateTime, Utc};
use etl::EnrichedJobRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 发布日期范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// 数据集汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_jobs: usize,
    pub unique_companies: usize,
    pub unique_locations: usize,
    pub big_tech_jobs: usize,
    pub big_tech_percentage: f64,
    /// 有 `salary_min` 的记录数
    pub jobs_with_salary: usize,
    /// `salary_avg` 的均值（仅非空值）
    pub avg_salary: f64,
    pub median_salary: f64,
    pub date_range: DateRange,
}

/// 计算汇总统计
pub fn summarize(records: &[EnrichedJobRecord]) -> DatasetSummary {
    let total_jobs = records.len();

    let unique_companies = records
        .iter()
        .filter_map(|r| r.job.company.as_deref())
        .collect::<HashSet<_>>()
        .len();
    let unique_locations = records
        .iter()
        .filter_map(|r| r.job.location.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let big_tech_jobs = records.iter().filter(|r| r.features.is_big_tech).count();
    let jobs_with_salary = records.iter().filter(|r| r.job.salary_min.is_some()).count();

    let salaries: Vec<f64> = records.iter().filter_map(|r| r.job.salary_avg).collect();

    let dates = records.iter().filter_map(|r| r.created());
    let date_range = DateRange {
        start: dates.clone().min(),
        end: dates.max(),
    };

    DatasetSummary {
        total_jobs,
        unique_companies,
        unique_locations,
        big_tech_jobs,
        big_tech_percentage: percentage(big_tech_jobs, total_jobs),
        jobs_with_salary,
        avg_salary: mean(&salaries).unwrap_or(0.0),
        median_salary: median(&salaries).unwrap_or(0.0),
        date_range,
    }
}

/// 计数及占全部记录的百分比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountShare {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

/// 报告用的分布统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub top_companies: Vec<CountShare>,
    pub top_locations: Vec<CountShare>,
    pub experience_levels: Vec<CountShare>,
    /// 按提及次数降序，次数相同保持模式表顺序
    pub tech_mentions: Vec<CountShare>,
}

/// 计算分布：公司和地点取前 `top_n`，并列时按名称排序
pub fn breakdown(records: &[EnrichedJobRecord], top_n: usize) -> Breakdown {
    let total = records.len();

    let mut top_companies = ranked(records.iter().filter_map(|r| r.job.company.as_deref()), total);
    top_companies.truncate(top_n);

    let mut top_locations = ranked(records.iter().filter_map(|r| r.job.location.as_deref()), total);
    top_locations.truncate(top_n);

    let experience_levels = ranked(
        records.iter().map(|r| r.features.experience_level.as_str()),
        total,
    );

    Breakdown {
        top_companies,
        top_locations,
        experience_levels,
        tech_mentions: tech_mentions(records),
    }
}

fn ranked<'a>(values: impl Iterator<Item = &'a str>, total: usize) -> Vec<CountShare> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    // BTreeMap 已按名称有序，稳定排序后并列项保持字母序
    let mut ranked: Vec<CountShare> = counts
        .into_iter()
        .map(|(name, count)| CountShare {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

fn tech_mentions(records: &[EnrichedJobRecord]) -> Vec<CountShare> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        for (name, hit) in &record.features.tech_mentions {
            let count = counts.entry(name.as_str()).or_insert_with(|| {
                order.push(name.as_str());
                0
            });
            if *hit {
                *count += 1;
            }
        }
    }

    let mut mentions: Vec<CountShare> = order
        .into_iter()
        .map(|name| {
            let count = counts.get(name).copied().unwrap_or_default();
            CountShare {
                name: name.to_string(),
                count,
                percentage: percentage(count, records.len()),
            }
        })
        .collect();
    mentions.sort_by(|a, b| b.count.cmp(&a.count));
    mentions
}

/// 百分比，分母为 0 时为 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// 中位数，偶数个取中间两个的平均
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
