//! 原始记录规范化
//!
//! 任何字段都可能缺失或格式错误：无法解析的值一律变为 `None`，
//! 规范化本身从不失败。

use crate::types::{NormalizedJobRecord, RawJobRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// 被丢弃的格式错误字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

/// 记录规范化器
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &RawJobRecord) -> NormalizedJobRecord {
        self.normalize_with_issues(raw).0
    }

    /// 规范化并返回被丢弃的字段
    pub fn normalize_with_issues(
        &self,
        raw: &RawJobRecord,
    ) -> (NormalizedJobRecord, Vec<MalformedField>) {
        let mut reader = FieldReader {
            raw,
            issues: Vec::new(),
        };

        let salary_min = reader.number("salary_min", &["salary_min"]);
        let salary_max = reader.number("salary_max", &["salary_max"]);
        let salary_avg = match (salary_min, salary_max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            _ => None,
        };

        let record = NormalizedJobRecord {
            id: reader.id(),
            title: reader.text("title", &["title"]),
            company: reader.nested_text("company", "company", "display_name"),
            location: reader.nested_text("location", "location", "display_name"),
            area: reader.area(),
            description: reader.text("description", &["description"]),
            salary_min,
            salary_max,
            salary_avg,
            salary_is_predicted: reader.flag(&["salary_is_predicted"]),
            created: reader.timestamp("created", &["created"]),
            redirect_url: reader.text("redirect_url", &["redirect_url"]),
            category: reader.nested_text("category", "category", "label"),
            contract_type: reader.text("contract_type", &["contract_type"]),
            contract_time: reader.text("contract_time", &["contract_time"]),
            latitude: reader.number("latitude", &["latitude"]),
            longitude: reader.number("longitude", &["longitude"]),
        };

        (record, reader.issues)
    }
}

struct FieldReader<'a> {
    raw: &'a RawJobRecord,
    issues: Vec<MalformedField>,
}

impl<'a> FieldReader<'a> {
    fn reject(&mut self, field: &'static str, value: &Value) {
        self.issues.push(MalformedField {
            field,
            value: value.to_string(),
        });
    }

    fn id(&mut self) -> String {
        let raw = self.raw;
        match raw.field(&["id"]) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                self.reject("id", other);
                String::new()
            }
            None => String::new(),
        }
    }

    fn text(&mut self, field: &'static str, path: &[&str]) -> Option<String> {
        let raw = self.raw;
        let value = raw.field(path)?;
        self.text_value(field, value)
    }

    fn text_value(&mut self, field: &'static str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => clean_text(s),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.reject(field, other);
                None
            }
        }
    }

    /// Adzuna 把名称放在 `{key: {inner: ...}}` 中，部分数据源直接给字符串
    fn nested_text(&mut self, field: &'static str, key: &str, inner: &str) -> Option<String> {
        let raw = self.raw;
        match raw.field(&[key])? {
            Value::Object(_) => {
                let value = raw.field(&[key, inner])?;
                self.text_value(field, value)
            }
            other => self.text_value(field, other),
        }
    }

    fn area(&mut self) -> Option<String> {
        let raw = self.raw;
        match raw.field(&["location", "area"])? {
            Value::Array(parts) => {
                let parts: Vec<String> = parts
                    .iter()
                    .filter_map(|p| p.as_str().and_then(clean_text))
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            other => self.text_value("area", other),
        }
    }

    fn number(&mut self, field: &'static str, path: &[&str]) -> Option<f64> {
        let raw = self.raw;
        let value = raw.field(path)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match clean_text(s) {
                None => return None,
                Some(s) => s.parse::<f64>().ok(),
            },
            _ => None,
        };

        match parsed.filter(|v| v.is_finite()) {
            Some(v) => Some(v),
            None => {
                self.reject(field, value);
                None
            }
        }
    }

    fn timestamp(&mut self, field: &'static str, path: &[&str]) -> Option<DateTime<Utc>> {
        let raw = self.raw;
        let value = raw.field(path)?;
        let parsed = match value {
            Value::String(s) => match clean_text(s) {
                None => return None,
                Some(s) => parse_timestamp(&s),
            },
            _ => None,
        };

        if parsed.is_none() {
            self.reject(field, value);
        }
        parsed
    }

    fn flag(&self, path: &[&str]) -> bool {
        match self.raw.field(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes")
            }
            _ => false,
        }
    }
}

/// 去除首尾空白，空串和 "nan"/"none"/"null" 视为缺失
pub fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_lowercase().as_str() {
        "nan" | "none" | "null" => None,
        _ => Some(trimmed.to_string()),
    }
}

/// 解析时间戳：RFC 3339，或不带时区的日期时间/日期（按 UTC 处理）
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn normalize(value: Value) -> NormalizedJobRecord {
        Normalizer::new().normalize(&RawJobRecord::new(value))
    }

    #[test]
    fn test_adzuna_shape() {
        let job = normalize(json!({
            "id": "4123",
            "title": "  Backend Developer ",
            "company": { "display_name": "Oracle de México" },
            "location": { "display_name": "Zapopan, Jalisco", "area": ["México", "Jalisco", "Zapopan"] },
            "salary_min": 30000,
            "salary_max": "50000",
            "salary_is_predicted": "1",
            "description": "Java and SQL",
            "created": "2024-03-05T14:30:00Z",
            "category": { "label": "IT Jobs" },
            "contract_time": "full_time",
            "latitude": 20.72,
            "longitude": -103.39
        }));

        assert_eq!(job.id, "4123");
        assert_eq!(job.title.as_deref(), Some("Backend Developer"));
        assert_eq!(job.company.as_deref(), Some("Oracle de México"));
        assert_eq!(job.location.as_deref(), Some("Zapopan, Jalisco"));
        assert_eq!(job.area.as_deref(), Some("México, Jalisco, Zapopan"));
        assert_eq!(job.salary_avg, Some(40000.0));
        assert!(job.salary_is_predicted);
        assert_eq!(job.created, Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()));
        assert_eq!(job.category.as_deref(), Some("IT Jobs"));
        assert_eq!(job.contract_type, None);
        assert_eq!(job.latitude, Some(20.72));
    }

    #[test]
    fn test_salary_avg_requires_both_bounds() {
        let job = normalize(json!({ "id": "1", "salary_min": 1000 }));
        assert_eq!(job.salary_min, Some(1000.0));
        assert_eq!(job.salary_avg, None);

        let job = normalize(json!({ "id": "3", "salary_max": 2000 }));
        assert_eq!(job.salary_max, Some(2000.0));
        assert_eq!(job.salary_avg, None);

        let job = normalize(json!({ "id": "2", "salary_min": 1001, "salary_max": 2000 }));
        assert_eq!(job.salary_avg, Some(1500.5));
    }

    #[test]
    fn test_malformed_fields_become_none() {
        let raw = RawJobRecord::new(json!({
            "id": 77,
            "title": "nan",
            "company": "   ",
            "salary_min": "competitive",
            "salary_max": 5000,
            "created": "last tuesday",
            "latitude": [1, 2]
        }));
        let (job, issues) = Normalizer::new().normalize_with_issues(&raw);

        assert_eq!(job.id, "77");
        assert_eq!(job.title, None);
        assert_eq!(job.company, None);
        assert_eq!(job.salary_min, None);
        assert_eq!(job.salary_max, Some(5000.0));
        assert_eq!(job.salary_avg, None);
        assert_eq!(job.created, None);
        assert_eq!(job.latitude, None);

        let fields: Vec<&str> = issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["salary_min", "created", "latitude"]);
    }

    #[test]
    fn test_missing_id_is_empty() {
        let job = normalize(json!({ "title": "QA" }));
        assert_eq!(job.id, "");
        assert!(!job.salary_is_predicted);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T04:30:00-06:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("15/01/2024"), None);
    }
}
