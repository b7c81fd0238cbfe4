//! Engine configuration.
//!
//! # Responsibility
//! - Hold the keyword table and every analysis threshold in one place.
//! - Load overrides from TOML; every field falls back to its default.
//!
//! # Invariants
//! - Keywords are trimmed, lowercase and non-empty after normalization.
//! - `Other` never has keywords; it is the no-match fallback.
//! - A `keywords` table in TOML replaces the default table as a whole.

use crate::model::domain::DomainLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_STREAK_THRESHOLD_MINUTES: i64 = 120;
pub const DEFAULT_ROLLING_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_MIN_SAMPLES: usize = 5;
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.3;

const DEFAULT_KEYWORDS: &[(DomainLabel, &[&str])] = &[
    (
        DomainLabel::Generation,
        &[
            "create", "write", "draft", "author", "build", "develop", "code", "design",
            "produce", "generate", "make", "craft", "compose", "project", "implement",
            "program", "construct", "plan", "strategize", "brainstorm", "deep work", "focus",
            "flow",
        ],
    ),
    (
        DomainLabel::Charging,
        &[
            "rest", "sleep", "nap", "meditate", "relax", "recovery", "recharge", "break",
            "pause", "self-care", "downtime", "unwind", "leisure", "vacation", "holiday",
            "day off", "pto", "personal", "me time",
        ],
    ),
    (
        DomainLabel::Growth,
        &[
            "learn", "study", "read", "course", "class", "training", "development", "workshop",
            "seminar", "conference", "webinar", "education", "skill", "improve", "growth",
            "progress", "lecture", "tutorial", "lesson", "research", "explore", "practice",
        ],
    ),
    (
        DomainLabel::Connection,
        &[
            "meet", "call", "chat", "coffee", "lunch", "dinner", "social", "friend", "family",
            "network", "connect", "relationship", "date", "party", "gathering", "celebration",
            "hangout", "catch up", "reunion", "zoom", "teams", "google meet", "facetime",
            "1:1", "1-1", "one on one",
        ],
    ),
    (
        DomainLabel::Vitality,
        &[
            "gym", "workout", "exercise", "run", "jog", "yoga", "pilates", "health", "doctor",
            "medical", "dentist", "therapy", "fitness", "swim", "bike", "hike", "walk", "sport",
            "train", "physical", "nutrition", "diet", "massage", "stretch", "wellness",
        ],
    ),
];

/// Configuration loading and validation failures.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    EmptyKeyword(DomainLabel),
    KeywordsForOther,
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::EmptyKeyword(domain) => write!(f, "empty keyword configured for {domain}"),
            Self::KeywordsForOther => write!(f, "keywords cannot be configured for Other"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Ordered mapping from domain to its keyword list.
///
/// Iteration always follows domain priority order, regardless of the order
/// the table was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordConfig {
    domains: BTreeMap<DomainLabel, Vec<String>>,
}

impl KeywordConfig {
    /// Builds a normalized table.
    ///
    /// # Errors
    /// - `EmptyKeyword` when a keyword is blank after trimming.
    /// - `KeywordsForOther` when `Other` has entries.
    pub fn new<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (DomainLabel, Vec<K>)>,
        K: AsRef<str>,
    {
        let mut domains = BTreeMap::new();
        for (domain, keywords) in entries {
            let normalized = keywords
                .iter()
                .map(|keyword| keyword.as_ref().trim().to_lowercase())
                .collect::<Vec<_>>();
            domains.insert(domain, normalized);
        }

        let config = Self { domains };
        config.validate()?;
        Ok(config)
    }

    /// Keywords for `domain`, in match order. Empty when unconfigured.
    pub fn keywords(&self, domain: DomainLabel) -> &[String] {
        self.domains.get(&domain).map_or(&[], Vec::as_slice)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (domain, keywords) in &self.domains {
            if *domain == DomainLabel::Other && !keywords.is_empty() {
                return Err(ConfigError::KeywordsForOther);
            }
            if keywords.iter().any(|keyword| keyword.trim().is_empty()) {
                return Err(ConfigError::EmptyKeyword(*domain));
            }
        }
        Ok(())
    }

    fn normalized(self) -> Result<Self, ConfigError> {
        Self::new(self.domains)
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let domains = DEFAULT_KEYWORDS
            .iter()
            .map(|(domain, keywords)| {
                (
                    *domain,
                    keywords.iter().map(|keyword| keyword.to_string()).collect(),
                )
            })
            .collect();
        Self { domains }
    }
}

/// Aggregation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// A day counts toward the Generation streak above this many minutes.
    pub streak_threshold_minutes: i64,
    /// Trailing window for "current allocation".
    pub rolling_window_days: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            streak_threshold_minutes: DEFAULT_STREAK_THRESHOLD_MINUTES,
            rolling_window_days: DEFAULT_ROLLING_WINDOW_DAYS,
        }
    }
}

/// Correlation gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum paired dates before a pair is computed.
    pub min_samples: usize,
    /// Absolute coefficient a pair must exceed to be summarized.
    pub threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
            threshold: DEFAULT_CORRELATION_THRESHOLD,
        }
    }
}

/// Linear sentiment-polarity to happiness transform.
///
/// `happiness = round((polarity + offset) * scale)`, clamped to `1..=10`.
/// The defaults rescale `[-1, 1]` onto `[0, 10]`; there is no deeper model
/// behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HappinessScale {
    pub offset: f64,
    pub scale: f64,
}

impl Default for HappinessScale {
    fn default() -> Self {
        Self {
            offset: 1.0,
            scale: 5.0,
        }
    }
}

impl HappinessScale {
    /// Maps a polarity to a happiness score. `None` for non-finite input.
    pub fn happiness_from_polarity(&self, polarity: f64) -> Option<u8> {
        let raw = ((polarity + self.offset) * self.scale).round();
        if !raw.is_finite() {
            return None;
        }
        let clamped = raw.clamp(
            f64::from(crate::model::outcome::MIN_SCORE),
            f64::from(crate::model::outcome::MAX_SCORE),
        );
        Some(clamped as u8)
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub keywords: KeywordConfig,
    pub aggregation: AggregationConfig,
    pub correlation: CorrelationConfig,
    pub happiness: HappinessScale,
}

impl EngineConfig {
    /// Parses, normalizes and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = toml::from_str(text)?;
        config.keywords = config.keywords.normalized()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.keywords.validate()?;

        if self.aggregation.streak_threshold_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                field: "aggregation.streak_threshold_minutes",
                message: "must not be negative".to_string(),
            });
        }
        if self.aggregation.rolling_window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "aggregation.rolling_window_days",
                message: "must be at least 1".to_string(),
            });
        }
        // Pearson needs two points; anything lower is meaningless.
        if self.correlation.min_samples < 2 {
            return Err(ConfigError::InvalidValue {
                field: "correlation.min_samples",
                message: "must be at least 2".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.correlation.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "correlation.threshold",
                message: format!("{} is outside [0, 1)", self.correlation.threshold),
            });
        }
        if !self.happiness.offset.is_finite() || !self.happiness.scale.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "happiness",
                message: "offset and scale must be finite".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig, HappinessScale, KeywordConfig};
    use crate::model::domain::DomainLabel;

    #[test]
    fn default_table_covers_every_matchable_domain() {
        let config = KeywordConfig::default();
        for domain in DomainLabel::MATCHABLE {
            assert!(!config.keywords(domain).is_empty(), "{domain} has no keywords");
        }
        assert!(config.keywords(DomainLabel::Other).is_empty());
    }

    #[test]
    fn toml_overrides_thresholds_and_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [correlation]
            min_samples = 7

            [keywords]
            Growth = ["  Podcast "]
            "#,
        )
        .unwrap();

        assert_eq!(config.correlation.min_samples, 7);
        assert!((config.correlation.threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.aggregation.streak_threshold_minutes, 120);
        assert_eq!(config.keywords.keywords(DomainLabel::Growth), ["podcast"]);
        assert!(config.keywords.keywords(DomainLabel::Generation).is_empty());
    }

    #[test]
    fn rejects_blank_keywords_and_keywords_for_other() {
        let blank = EngineConfig::from_toml_str("[keywords]\nVitality = [\"run\", \"  \"]");
        assert!(matches!(
            blank,
            Err(ConfigError::EmptyKeyword(DomainLabel::Vitality))
        ));

        let other = KeywordConfig::new([(DomainLabel::Other, vec!["misc"])]);
        assert!(matches!(other, Err(ConfigError::KeywordsForOther)));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let err = EngineConfig::from_toml_str("[correlation]\nthreshold = 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "correlation.threshold",
                ..
            }
        ));
    }

    #[test]
    fn happiness_scale_rounds_and_clamps() {
        let scale = HappinessScale::default();
        assert_eq!(scale.happiness_from_polarity(0.0), Some(5));
        assert_eq!(scale.happiness_from_polarity(0.5), Some(8));
        assert_eq!(scale.happiness_from_polarity(0.45), Some(7));
        assert_eq!(scale.happiness_from_polarity(1.0), Some(10));
        assert_eq!(scale.happiness_from_polarity(-1.0), Some(1));
        assert_eq!(scale.happiness_from_polarity(f64::NAN), None);
    }
}
