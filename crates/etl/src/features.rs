//! 文本特征提取模块

use crate::config::PipelineConfig;
use crate::types::{ETLError, ETLResult, ExperienceLevel, JobFeatures, NormalizedJobRecord};
use regex::{Regex, RegexBuilder};

const SENIOR_PATTERN: &str =
    r"\b(senior|lead|principal|architect|manager|director)\b|\bsr\.";
const JUNIOR_PATTERN: &str = r"\b(junior|entry|trainee|intern|graduate)\b|\bjr\.";
const MID_PATTERN: &str = r"\b(mid|middle|intermediate)\b";

const REMOTE_PATTERN: &str = r"\b(remote|remoto|home office|trabajo desde casa|wfh)\b";
const HYBRID_PATTERN: &str = r"\b(hybrid|híbrido|mixto)\b";
const ONSITE_PATTERN: &str = r"\b(onsite|presencial|office|oficina)\b";

/// 特征提取器
pub struct FeatureExtractor {
    big_tech_companies: Vec<String>,
    tech_keywords: Vec<String>,
    tech_patterns: Vec<(String, Regex)>,
    senior: Regex,
    junior: Regex,
    mid: Regex,
    remote: Regex,
    hybrid: Regex,
    onsite: Regex,
}

impl FeatureExtractor {
    /// 编译配置中的所有模式，无效的正则表达式返回配置错误
    pub fn new(config: &PipelineConfig) -> ETLResult<Self> {
        let tech_patterns = config
            .tech_patterns
            .iter()
            .map(|p| Ok((p.name.clone(), compile(&p.pattern)?)))
            .collect::<ETLResult<Vec<_>>>()?;

        Ok(Self {
            big_tech_companies: config
                .big_tech_companies
                .iter()
                .map(|c| c.to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            tech_keywords: config
                .tech_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            tech_patterns,
            senior: compile(SENIOR_PATTERN)?,
            junior: compile(JUNIOR_PATTERN)?,
            mid: compile(MID_PATTERN)?,
            remote: compile(REMOTE_PATTERN)?,
            hybrid: compile(HYBRID_PATTERN)?,
            onsite: compile(ONSITE_PATTERN)?,
        })
    }

    /// 提取单条记录的全部特征
    pub fn extract(&self, job: &NormalizedJobRecord) -> JobFeatures {
        let title = job.title.as_deref().unwrap_or_default();
        let text = job.search_text();

        let is_senior = self.senior.is_match(title);
        let is_junior = self.junior.is_match(title);
        let is_mid = self.mid.is_match(title);

        let mentioned_tech_keywords = self.match_keywords(&text);

        JobFeatures {
            is_big_tech: self.is_big_tech(job.company.as_deref()),
            experience_level: classify_level(is_senior, is_junior, is_mid),
            is_senior,
            is_junior,
            is_mid,
            is_remote: self.remote.is_match(&text),
            is_hybrid: self.hybrid.is_match(&text),
            is_onsite: self.onsite.is_match(&text),
            tech_mentions: self
                .tech_patterns
                .iter()
                .map(|(name, re)| (name.clone(), re.is_match(&text)))
                .collect(),
            tech_keywords_count: mentioned_tech_keywords.len(),
            mentioned_tech_keywords,
        }
    }

    /// 公司名包含任一追踪公司名（子串，不区分大小写）
    pub fn is_big_tech(&self, company: Option<&str>) -> bool {
        let Some(company) = company else {
            return false;
        };
        let company = company.to_lowercase();
        self.big_tech_companies
            .iter()
            .any(|name| company.contains(name.as_str()))
    }

    pub fn experience_level(&self, title: &str) -> ExperienceLevel {
        classify_level(
            self.senior.is_match(title),
            self.junior.is_match(title),
            self.mid.is_match(title),
        )
    }

    fn match_keywords(&self, text: &str) -> Vec<String> {
        self.tech_keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .cloned()
            .collect()
    }
}

/// Senior > Junior > Mid > Unspecified
fn classify_level(is_senior: bool, is_junior: bool, is_mid: bool) -> ExperienceLevel {
    if is_senior {
        ExperienceLevel::Senior
    } else if is_junior {
        ExperienceLevel::Junior
    } else if is_mid {
        ExperienceLevel::Mid
    } else {
        ExperienceLevel::Unspecified
    }
}

fn compile(pattern: &str) -> ETLResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ETLError::InvalidConfig(format!("无效的模式 {:?}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TechPattern;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(&PipelineConfig::default()).unwrap()
    }

    fn job(title: Option<&str>, company: Option<&str>, description: Option<&str>) -> NormalizedJobRecord {
        let mut job = NormalizedJobRecord::with_id("test");
        job.title = title.map(str::to_string);
        job.company = company.map(str::to_string);
        job.description = description.map(str::to_string);
        job
    }

    #[test]
    fn test_senior_microsoft_remote_python() {
        let features = extractor().extract(&job(
            Some("Senior Software Engineer"),
            Some("Microsoft Corp"),
            Some("Remote role using Python and AWS"),
        ));

        assert_eq!(features.experience_level, ExperienceLevel::Senior);
        assert!(features.is_big_tech);
        assert!(features.is_remote);
        assert!(!features.is_hybrid);
        assert!(features.mentions("python"));
        assert!(features.mentions("cloud"));
        assert!(!features.mentions("java"));
        assert_eq!(features.mentioned_tech_keywords, vec!["software engineer"]);
        assert_eq!(features.tech_keywords_count, 1);
    }

    #[test]
    fn test_level_priority() {
        let extractor = extractor();

        assert_eq!(extractor.experience_level("Senior/Junior Developer"), ExperienceLevel::Senior);
        assert_eq!(extractor.experience_level("Junior Intern, mid-level"), ExperienceLevel::Junior);
        assert_eq!(extractor.experience_level("Intermediate QA"), ExperienceLevel::Mid);
        assert_eq!(extractor.experience_level("Sr. Data Engineer"), ExperienceLevel::Senior);
        assert_eq!(extractor.experience_level("Developer"), ExperienceLevel::Unspecified);
        assert_eq!(extractor.experience_level(""), ExperienceLevel::Unspecified);
    }

    #[test]
    fn test_level_respects_word_boundaries() {
        let extractor = extractor();

        // "leader" / "internal" / "midnight" are not level words
        assert_eq!(extractor.experience_level("Team Leadership Coach"), ExperienceLevel::Unspecified);
        assert_eq!(extractor.experience_level("Internal Tools Engineer"), ExperienceLevel::Unspecified);
        assert_eq!(extractor.experience_level("Midnight Support"), ExperienceLevel::Unspecified);
    }

    #[test]
    fn test_modality_flags_are_independent() {
        let features = extractor().extract(&job(
            Some("Desarrollador Java"),
            Some("Acme"),
            Some("Esquema híbrido: 3 días en oficina y home office"),
        ));

        assert!(features.is_remote);
        assert!(features.is_hybrid);
        assert!(features.is_onsite);
        assert!(features.mentions("java"));
        assert!(!features.mentions("javascript"));
    }

    #[test]
    fn test_modality_respects_word_boundaries() {
        let features = extractor().extract(&job(
            Some("Compliance Officer"),
            Some("Acme"),
            Some("Remoteness of the branch is not an issue"),
        ));
        assert!(!features.is_onsite);
        assert!(!features.is_remote);
        assert!(!features.is_hybrid);

        let features = extractor().extract(&job(Some("Analyst"), None, Some("Work from our office")));
        assert!(features.is_onsite);
    }

    #[test]
    fn test_keywords_are_lowercased_and_blank_dropped() {
        let mut config = PipelineConfig::default();
        config.tech_keywords = vec!["".to_string(), "Data Analyst".to_string()];
        let extractor = FeatureExtractor::new(&config).unwrap();

        let features = extractor.extract(&job(Some("Senior DATA ANALYST"), None, None));
        assert_eq!(features.mentioned_tech_keywords, vec!["data analyst"]);
        assert_eq!(features.tech_keywords_count, 1);

        let features = extractor.extract(&job(Some("Cook"), None, None));
        assert_eq!(features.tech_keywords_count, 0);
    }

    #[test]
    fn test_big_tech_is_substring_match() {
        let extractor = extractor();

        assert!(extractor.is_big_tech(Some("MicroSoft Solutions LLC")));
        assert!(extractor.is_big_tech(Some("Oracle de México, S.A.")));
        assert!(!extractor.is_big_tech(Some("Acme Software")));
        assert!(!extractor.is_big_tech(None));
    }

    #[test]
    fn test_missing_text_is_scanned_as_empty() {
        let record = job(None, None, None);
        let features = extractor().extract(&record);

        assert_eq!(features.experience_level, ExperienceLevel::Unspecified);
        assert!(!features.is_remote);
        assert!(features.tech_mentions.iter().all(|(_, hit)| !hit));
        assert_eq!(features.tech_keywords_count, 0);
        assert!(record.title.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn test_invalid_tech_pattern_is_config_error() {
        let mut config = PipelineConfig::default();
        config.tech_patterns.push(TechPattern::new("broken", r"\b(rust"));

        let err = FeatureExtractor::new(&config).err().unwrap();
        assert!(matches!(err, ETLError::InvalidConfig(_)));
    }
}
