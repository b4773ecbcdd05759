//! 建模数据准备：类别编码、缺失值填充、布尔转换、标准化

use crate::summary::median;
use crate::types::{AnalyticsError, AnalyticsResult};
use etl::EnrichedJobRecord;
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::str::FromStr;

/// 缺失类别的占位值
pub const UNKNOWN: &str = "Unknown";

/// 可编码的类别字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    Company,
    Location,
    Category,
    ContractType,
    ContractTime,
    ExperienceLevel,
}

impl CategoricalField {
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Company => "company",
            CategoricalField::Location => "location",
            CategoricalField::Category => "category",
            CategoricalField::ContractType => "contract_type",
            CategoricalField::ContractTime => "contract_time",
            CategoricalField::ExperienceLevel => "experience_level",
        }
    }

    pub fn value(&self, record: &EnrichedJobRecord) -> Option<String> {
        let job = &record.job;
        match self {
            CategoricalField::Company => job.company.clone(),
            CategoricalField::Location => job.location.clone(),
            CategoricalField::Category => job.category.clone(),
            CategoricalField::ContractType => job.contract_type.clone(),
            CategoricalField::ContractTime => job.contract_time.clone(),
            CategoricalField::ExperienceLevel => {
                Some(record.features.experience_level.as_str().to_string())
            }
        }
    }
}

impl FromStr for CategoricalField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(CategoricalField::Company),
            "location" => Ok(CategoricalField::Location),
            "category" => Ok(CategoricalField::Category),
            "contract_type" => Ok(CategoricalField::ContractType),
            "contract_time" => Ok(CategoricalField::ContractTime),
            "experience_level" => Ok(CategoricalField::ExperienceLevel),
            _ => Err(AnalyticsError::UnknownField(s.to_string())),
        }
    }
}

/// 需要填充缺失值的数值字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericField {
    SalaryMin,
    SalaryMax,
    SalaryAvg,
    TechKeywordsCount,
    Latitude,
    Longitude,
    Year,
    Month,
    Day,
    DayOfWeek,
}

impl NumericField {
    pub fn name(&self) -> &'static str {
        match self {
            NumericField::SalaryMin => "salary_min",
            NumericField::SalaryMax => "salary_max",
            NumericField::SalaryAvg => "salary_avg",
            NumericField::TechKeywordsCount => "tech_keywords_count",
            NumericField::Latitude => "latitude",
            NumericField::Longitude => "longitude",
            NumericField::Year => "year",
            NumericField::Month => "month",
            NumericField::Day => "day",
            NumericField::DayOfWeek => "day_of_week",
        }
    }

    pub fn value(&self, record: &EnrichedJobRecord) -> Option<f64> {
        let job = &record.job;
        let calendar = record.calendar.as_ref();
        match self {
            NumericField::SalaryMin => job.salary_min,
            NumericField::SalaryMax => job.salary_max,
            NumericField::SalaryAvg => job.salary_avg,
            NumericField::TechKeywordsCount => Some(record.features.tech_keywords_count as f64),
            NumericField::Latitude => job.latitude,
            NumericField::Longitude => job.longitude,
            NumericField::Year => calendar.map(|c| f64::from(c.year)),
            NumericField::Month => calendar.map(|c| f64::from(c.month)),
            NumericField::Day => calendar.map(|c| f64::from(c.day)),
            NumericField::DayOfWeek => calendar.map(|c| f64::from(c.day_of_week)),
        }
    }
}

impl FromStr for NumericField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salary_min" => Ok(NumericField::SalaryMin),
            "salary_max" => Ok(NumericField::SalaryMax),
            "salary_avg" => Ok(NumericField::SalaryAvg),
            "tech_keywords_count" => Ok(NumericField::TechKeywordsCount),
            "latitude" => Ok(NumericField::Latitude),
            "longitude" => Ok(NumericField::Longitude),
            "year" => Ok(NumericField::Year),
            "month" => Ok(NumericField::Month),
            "day" => Ok(NumericField::Day),
            "day_of_week" => Ok(NumericField::DayOfWeek),
            _ => Err(AnalyticsError::UnknownField(s.to_string())),
        }
    }
}

/// 编码配置（字段名列表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparationConfig {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self {
            categorical: [
                "company",
                "location",
                "category",
                "contract_type",
                "contract_time",
                "experience_level",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            numeric: [
                "salary_min",
                "salary_max",
                "salary_avg",
                "tech_keywords_count",
                "latitude",
                "longitude",
                "year",
                "month",
                "day",
                "day_of_week",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl PreparationConfig {
    /// 解析字段名，未知字段返回错误
    pub fn resolve(&self) -> AnalyticsResult<(Vec<CategoricalField>, Vec<NumericField>)> {
        let categorical = self
            .categorical
            .iter()
            .map(|name| name.parse())
            .collect::<AnalyticsResult<Vec<_>>>()?;
        let numeric = self
            .numeric
            .iter()
            .map(|name| name.parse())
            .collect::<AnalyticsResult<Vec<_>>>()?;
        Ok((categorical, numeric))
    }
}

/// 类别编码器，编码顺序即类别的排序顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let mut classes: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// 建模用数据集
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub ids: Vec<String>,
    /// 与 `features` 的列一一对应
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    /// 每个类别字段填充后的原始值，按行排列
    pub categorical_values: Vec<(CategoricalField, Vec<String>)>,
    pub encoders: Vec<(CategoricalField, LabelEncoder)>,
    /// 每个数值字段使用的填充值
    pub imputed_medians: Vec<(NumericField, f64)>,
    /// 数值字段在 `features` 中的列范围
    pub numeric_columns: Range<usize>,
}

impl PreparedDataset {
    pub fn encoder(&self, field: CategoricalField) -> Option<&LabelEncoder> {
        self.encoders
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, encoder)| encoder)
    }

    pub fn column(&self, name: &str) -> Option<Array1<f64>> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.features.column(idx).to_owned())
    }

    /// 还原某个类别字段（缺失值显示为 `Unknown`）
    pub fn decode_column(&self, field: CategoricalField) -> Option<Vec<String>> {
        let encoder = self.encoder(field)?;
        let codes = self.column(&format!("{}_encoded", field.name()))?;
        codes
            .iter()
            .map(|code| encoder.decode(*code as usize).map(str::to_string))
            .collect()
    }

    /// 标准化数值列，返回拟合的缩放器
    pub fn standardize_numeric(&mut self) -> AnalyticsResult<Option<Scaler>> {
        if self.features.nrows() == 0 || self.numeric_columns.is_empty() {
            return Ok(None);
        }

        let range = self.numeric_columns.clone();
        let numeric = self.features.slice(s![.., range.clone()]).to_owned();
        let (scaler, scaled) = Scaler::fit_transform(&numeric)?;
        self.features.slice_mut(s![.., range]).assign(&scaled);
        Ok(Some(scaler))
    }
}

/// 准备建模数据
///
/// 列顺序：类别编码列、数值列、布尔列（`is_*`、`mentions_*`）。
pub fn prepare(
    records: &[EnrichedJobRecord],
    config: &PreparationConfig,
) -> AnalyticsResult<PreparedDataset> {
    let (categorical, numeric) = config.resolve()?;
    let boolean_names = boolean_feature_names(records);

    let n_rows = records.len();
    let n_cols = categorical.len() + numeric.len() + boolean_names.len();
    let mut features = Array2::<f64>::zeros((n_rows, n_cols));
    let mut feature_names = Vec::with_capacity(n_cols);

    let mut categorical_values = Vec::with_capacity(categorical.len());
    let mut encoders = Vec::with_capacity(categorical.len());
    for (col, field) in categorical.iter().enumerate() {
        let values: Vec<String> = records
            .iter()
            .map(|r| field.value(r).unwrap_or_else(|| UNKNOWN.to_string()))
            .collect();
        let encoder = LabelEncoder::fit(&values);

        for (row, value) in values.iter().enumerate() {
            let code = encoder.encode(value).ok_or_else(|| {
                AnalyticsError::Preprocessing(format!("无法编码 {}: {}", field.name(), value))
            })?;
            features[[row, col]] = code as f64;
        }

        feature_names.push(format!("{}_encoded", field.name()));
        categorical_values.push((*field, values));
        encoders.push((*field, encoder));
    }

    let numeric_start = categorical.len();
    let mut imputed_medians = Vec::with_capacity(numeric.len());
    for (offset, field) in numeric.iter().enumerate() {
        let col = numeric_start + offset;
        let values: Vec<Option<f64>> = records.iter().map(|r| field.value(r)).collect();
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        // 全部缺失时用 0 填充
        let fill = median(&present).unwrap_or(0.0);

        for (row, value) in values.iter().enumerate() {
            features[[row, col]] = value.unwrap_or(fill);
        }

        feature_names.push(field.name().to_string());
        imputed_medians.push((*field, fill));
    }

    let boolean_start = numeric_start + numeric.len();
    for (row, record) in records.iter().enumerate() {
        for (offset, hit) in boolean_values(record, &boolean_names).into_iter().enumerate() {
            features[[row, boolean_start + offset]] = if hit { 1.0 } else { 0.0 };
        }
    }
    feature_names.extend(boolean_names);

    Ok(PreparedDataset {
        ids: records.iter().map(|r| r.id().to_string()).collect(),
        feature_names,
        features,
        categorical_values,
        encoders,
        imputed_medians,
        numeric_columns: numeric_start..boolean_start,
    })
}

const FIXED_BOOLEANS: [&str; 10] = [
    "is_big_tech",
    "is_senior",
    "is_junior",
    "is_mid",
    "is_remote",
    "is_hybrid",
    "is_onsite",
    "is_weekend",
    "is_month_start",
    "is_month_end",
];

fn boolean_feature_names(records: &[EnrichedJobRecord]) -> Vec<String> {
    let mut names: Vec<String> = FIXED_BOOLEANS.iter().map(|n| n.to_string()).collect();
    if let Some(first) = records.first() {
        names.extend(
            first
                .features
                .tech_mentions
                .iter()
                .map(|(tech, _)| format!("mentions_{}", tech)),
        );
    }
    names
}

fn boolean_values(record: &EnrichedJobRecord, names: &[String]) -> Vec<bool> {
    let f = &record.features;
    let calendar = record.calendar.as_ref();
    names
        .iter()
        .map(|name| match name.as_str() {
            "is_big_tech" => f.is_big_tech,
            "is_senior" => f.is_senior,
            "is_junior" => f.is_junior,
            "is_mid" => f.is_mid,
            "is_remote" => f.is_remote,
            "is_hybrid" => f.is_hybrid,
            "is_onsite" => f.is_onsite,
            "is_weekend" => record.is_weekend(),
            "is_month_start" => calendar.is_some_and(|c| c.is_month_start),
            "is_month_end" => calendar.is_some_and(|c| c.is_month_end),
            other => other
                .strip_prefix("mentions_")
                .is_some_and(|tech| f.mentions(tech)),
        })
        .collect()
}

/// 特征缩放器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// 从数据拟合缩放器
    pub fn fit(data: &Array2<f64>) -> AnalyticsResult<Self> {
        if data.is_empty() {
            return Err(AnalyticsError::Preprocessing("数据为空".to_string()));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalyticsError::Preprocessing("无法计算均值".to_string()))?;

        let std = data.std_axis(Axis(0), 0.0);

        Ok(Self { mean, std })
    }

    /// 标准化数据
    pub fn transform(&self, data: &Array2<f64>) -> AnalyticsResult<Array2<f64>> {
        self.check_width(data)?;

        let mut normalized = data.clone();
        for mut row in normalized.axis_iter_mut(Axis(0)) {
            for (j, val) in row.iter_mut().enumerate() {
                *val = (*val - self.mean[j]) / self.safe_std(j);
            }
        }

        Ok(normalized)
    }

    /// 拟合并转换
    pub fn fit_transform(data: &Array2<f64>) -> AnalyticsResult<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let transformed = scaler.transform(data)?;
        Ok((scaler, transformed))
    }

    /// 反标准化
    pub fn inverse_transform(&self, data: &Array2<f64>) -> AnalyticsResult<Array2<f64>> {
        self.check_width(data)?;

        let mut denormalized = data.clone();
        for mut row in denormalized.axis_iter_mut(Axis(0)) {
            for (j, val) in row.iter_mut().enumerate() {
                *val = (*val * self.safe_std(j)) + self.mean[j];
            }
        }

        Ok(denormalized)
    }

    fn check_width(&self, data: &Array2<f64>) -> AnalyticsResult<()> {
        if data.ncols() != self.mean.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.mean.len(),
                actual: data.ncols(),
            });
        }
        Ok(())
    }

    /// 常数列不缩放
    fn safe_std(&self, j: usize) -> f64 {
        if self.std[j].abs() < 1e-10 {
            1.0
        } else {
            self.std[j]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use etl::{DataEnricher, NormalizedJobRecord, PipelineConfig};

    fn records() -> Vec<EnrichedJobRecord> {
        let mut a = NormalizedJobRecord::with_id("a");
        a.title = Some("Senior Python Engineer".to_string());
        a.company = Some("Oracle".to_string());
        a.contract_type = Some("permanent".to_string());
        a.salary_min = Some(10.0);
        a.created = Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());

        let mut b = NormalizedJobRecord::with_id("b");
        b.title = Some("QA Analyst".to_string());
        b.company = Some("Acme".to_string());
        b.salary_min = Some(30.0);

        let mut c = NormalizedJobRecord::with_id("c");
        c.title = Some("Remote Java Developer".to_string());
        c.contract_type = Some("contract".to_string());
        c.salary_min = Some(20.0);

        let d = NormalizedJobRecord::with_id("d");

        DataEnricher::new(&PipelineConfig::default())
            .unwrap()
            .enrich_batch(vec![a, b, c, d])
    }

    #[test]
    fn test_label_encoder_sorted_codes() {
        let encoder = LabelEncoder::fit(&["zapopan", "guadalajara", "zapopan", "Unknown"]);

        assert_eq!(encoder.classes(), &["Unknown", "guadalajara", "zapopan"]);
        assert_eq!(encoder.encode("guadalajara"), Some(1));
        assert_eq!(encoder.encode("tonala"), None);
        assert_eq!(encoder.decode(2), Some("zapopan"));
        assert_eq!(encoder.decode(3), None);
    }

    #[test]
    fn test_categorical_round_trip_with_unknown() {
        let dataset = prepare(&records(), &PreparationConfig::default()).unwrap();

        let decoded = dataset.decode_column(CategoricalField::Company).unwrap();
        assert_eq!(decoded, vec!["Oracle", "Acme", UNKNOWN, UNKNOWN]);

        let contract = dataset.decode_column(CategoricalField::ContractType).unwrap();
        assert_eq!(contract, vec!["permanent", UNKNOWN, "contract", UNKNOWN]);

        // "Acme" < "Oracle" < "Unknown"
        let codes = dataset.column("company_encoded").unwrap();
        assert_eq!(codes.to_vec(), vec![1.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn test_numeric_median_imputation() {
        let dataset = prepare(&records(), &PreparationConfig::default()).unwrap();

        let salary = dataset.column("salary_min").unwrap();
        assert_eq!(salary.to_vec(), vec![10.0, 30.0, 20.0, 20.0]);

        // 全部缺失时填 0
        let latitude = dataset.column("latitude").unwrap();
        assert!(latitude.iter().all(|v| *v == 0.0));

        let year = dataset.column("year").unwrap();
        assert!(year.iter().all(|v| *v == 2024.0));
    }

    #[test]
    fn test_boolean_features() {
        let dataset = prepare(&records(), &PreparationConfig::default()).unwrap();

        assert_eq!(dataset.column("is_big_tech").unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(dataset.column("is_remote").unwrap().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(dataset.column("mentions_python").unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(dataset.column("mentions_java").unwrap().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(dataset.column("is_weekend").unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(dataset.features.ncols(), dataset.feature_names.len());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let config = PreparationConfig {
            numeric: vec!["salary_min".to_string(), "bonus".to_string()],
            ..PreparationConfig::default()
        };

        assert!(matches!(
            prepare(&records(), &config),
            Err(AnalyticsError::UnknownField(name)) if name == "bonus"
        ));
    }

    #[test]
    fn test_empty_input() {
        let dataset = prepare(&[], &PreparationConfig::default()).unwrap();

        assert_eq!(dataset.features.nrows(), 0);
        assert!(dataset.ids.is_empty());
    }

    #[test]
    fn test_standardize_numeric_columns_only() {
        let mut dataset = prepare(&records(), &PreparationConfig::default()).unwrap();
        let codes_before = dataset.column("company_encoded").unwrap();

        let scaler = dataset.standardize_numeric().unwrap().unwrap();

        assert_eq!(scaler.mean.len(), dataset.numeric_columns.len());
        assert_eq!(dataset.column("company_encoded").unwrap(), codes_before);
        let salary = dataset.column("salary_min").unwrap();
        assert!(salary.sum().abs() < 1e-10);
    }

    #[test]
    fn test_scaler() {
        let data = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let (scaler, transformed) = Scaler::fit_transform(&data).unwrap();

        assert!(transformed.mean_axis(Axis(0)).unwrap().iter().all(|&x| x.abs() < 1e-10));

        let reconstructed = scaler.inverse_transform(&transformed).unwrap();
        assert!((reconstructed - data).mapv(|x| x.abs()).sum() < 1e-10);

        let narrow = Array2::<f64>::zeros((2, 1));
        assert!(matches!(
            scaler.transform(&narrow),
            Err(AnalyticsError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }
}
