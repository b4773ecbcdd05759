//! 表格输出
//!
//! 增强记录、汇总、时间序列和建模数据都转换为 `Table`，再渲染为分隔文本。
//! 文件写入由调用方负责。

use crate::preprocessing::PreparedDataset;
use crate::summary::DatasetSummary;
use crate::timeseries::TimeSeriesPoint;
use etl::EnrichedJobRecord;
use serde_json::{json, Value};

/// 具名列 + 等宽行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 渲染为分隔文本（含表头），必要时加引号
    pub fn to_delimited(&self, delimiter: char) -> String {
        let mut out = String::new();
        write_line(&mut out, self.columns.iter().map(String::as_str), delimiter);
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            write_line(&mut out, cells.iter().map(String::as_str), delimiter);
        }
        out
    }

    pub fn to_csv(&self) -> String {
        self.to_delimited(',')
    }
}

fn write_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, delimiter: char) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote(cell, delimiter));
    }
    out.push('\n');
}

fn quote(cell: &str, delimiter: char) -> String {
    if cell.contains(delimiter) || cell.contains(&['"', '\n', '\r'][..]) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 增强记录表
pub fn enriched_table(records: &[EnrichedJobRecord]) -> Table {
    let tech_names: Vec<String> = records
        .first()
        .map(|r| r.features.tech_mentions.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default();

    let mut columns: Vec<String> = [
        "id",
        "title",
        "company",
        "location",
        "area",
        "description",
        "salary_min",
        "salary_max",
        "salary_avg",
        "salary_is_predicted",
        "created",
        "redirect_url",
        "category",
        "contract_type",
        "contract_time",
        "latitude",
        "longitude",
        "is_big_tech",
        "experience_level",
        "is_senior",
        "is_junior",
        "is_mid",
        "is_remote",
        "is_hybrid",
        "is_onsite",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    columns.extend(tech_names.iter().map(|name| format!("mentions_{}", name)));
    columns.extend(
        [
            "mentioned_tech_keywords",
            "tech_keywords_count",
            "year",
            "month",
            "day",
            "day_of_week",
            "week_of_year",
            "quarter",
            "day_name",
            "month_name",
            "is_weekend",
            "is_month_start",
            "is_month_end",
        ]
        .iter()
        .map(|c| c.to_string()),
    );

    let mut table = Table::new(columns);
    for record in records {
        let job = &record.job;
        let f = &record.features;
        let cal = record.calendar.as_ref();

        let mut row = vec![
            json!(job.id),
            json!(job.title),
            json!(job.company),
            json!(job.location),
            json!(job.area),
            json!(job.description),
            json!(job.salary_min),
            json!(job.salary_max),
            json!(job.salary_avg),
            json!(job.salary_is_predicted),
            json!(job.created.map(|c| c.to_rfc3339())),
            json!(job.redirect_url),
            json!(job.category),
            json!(job.contract_type),
            json!(job.contract_time),
            json!(job.latitude),
            json!(job.longitude),
            json!(f.is_big_tech),
            json!(f.experience_level.as_str()),
            json!(f.is_senior),
            json!(f.is_junior),
            json!(f.is_mid),
            json!(f.is_remote),
            json!(f.is_hybrid),
            json!(f.is_onsite),
        ];
        row.extend(tech_names.iter().map(|name| json!(f.mentions(name))));
        row.extend([
            json!(f.mentioned_tech_keywords.join(", ")),
            json!(f.tech_keywords_count),
            json!(cal.map(|c| c.year)),
            json!(cal.map(|c| c.month)),
            json!(cal.map(|c| c.day)),
            json!(cal.map(|c| c.day_of_week)),
            json!(cal.map(|c| c.week_of_year)),
            json!(cal.map(|c| c.quarter)),
            json!(cal.map(|c| c.day_name.as_str())),
            json!(cal.map(|c| c.month_name.as_str())),
            json!(record.is_weekend()),
            json!(cal.is_some_and(|c| c.is_month_start)),
            json!(cal.is_some_and(|c| c.is_month_end)),
        ]);
        table.push_row(row);
    }
    table
}

/// 汇总表（指标, 值）
pub fn summary_table(summary: &DatasetSummary) -> Table {
    let mut table = Table::new(vec!["metric".to_string(), "value".to_string()]);
    let rows = [
        ("total_jobs", json!(summary.total_jobs)),
        ("unique_companies", json!(summary.unique_companies)),
        ("unique_locations", json!(summary.unique_locations)),
        ("big_tech_jobs", json!(summary.big_tech_jobs)),
        ("big_tech_percentage", json!(summary.big_tech_percentage)),
        ("jobs_with_salary", json!(summary.jobs_with_salary)),
        ("avg_salary", json!(summary.avg_salary)),
        ("median_salary", json!(summary.median_salary)),
        ("date_start", json!(summary.date_range.start.map(|d| d.to_rfc3339()))),
        ("date_end", json!(summary.date_range.end.map(|d| d.to_rfc3339()))),
    ];
    for (metric, value) in rows {
        table.push_row(vec![json!(metric), value]);
    }
    table
}

/// 时间序列表
pub fn timeseries_table(points: &[TimeSeriesPoint]) -> Table {
    let mut table = Table::new(
        [
            "bucket_start",
            "job_count",
            "big_tech_count",
            "big_tech_percentage",
            "avg_salary",
            "avg_tech_keywords",
            "cumulative_jobs",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
    );
    for point in points {
        table.push_row(vec![
            json!(point.bucket_start.format("%Y-%m-%d").to_string()),
            json!(point.job_count),
            json!(point.big_tech_count),
            json!(point.big_tech_percentage),
            json!(point.avg_salary),
            json!(point.avg_tech_keywords),
            json!(point.cumulative_jobs),
        ]);
    }
    table
}

/// 建模数据表：ID、填充后的类别值、全部特征列
pub fn prepared_table(dataset: &PreparedDataset) -> Table {
    let mut columns = vec!["id".to_string()];
    columns.extend(
        dataset
            .categorical_values
            .iter()
            .map(|(field, _)| field.name().to_string()),
    );
    columns.extend(dataset.feature_names.iter().cloned());

    let mut table = Table::new(columns);
    for (row_idx, id) in dataset.ids.iter().enumerate() {
        let mut row = vec![json!(id)];
        row.extend(
            dataset
                .categorical_values
                .iter()
                .map(|(_, values)| json!(values[row_idx])),
        );
        row.extend(dataset.features.row(row_idx).iter().map(|v| json!(v)));
        table.push_row(row);
    }
    table
}
