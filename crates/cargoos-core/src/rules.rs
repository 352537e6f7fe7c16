use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPhrase {
    pub phrase: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    #[serde(default)]
    pub audited: f64,
    #[serde(default)]
    pub years_weight: f64,
}

/// Weights and thresholds for the factory classifier.
///
/// Phrase lists are ordered; evidence is reported in list order, positives
/// first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub threshold: f64,
    #[serde(default)]
    pub positive: Vec<WeightedPhrase>,
    #[serde(default)]
    pub negative: Vec<WeightedPhrase>,
    pub trust: TrustWeights,
    /// Marketplace tags that mark a supplier as audited.
    #[serde(default = "default_audit_tags")]
    pub audit_tags: Vec<String>,
}

fn default_audit_tags() -> Vec<String> {
    vec!["实地认证".to_string(), "实力商家".to_string()]
}

fn phrases(entries: &[(&str, f64)]) -> Vec<WeightedPhrase> {
    entries
        .iter()
        .map(|&(phrase, weight)| WeightedPhrase {
            phrase: phrase.to_string(),
            weight,
        })
        .collect()
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            positive: phrases(&[
                ("源头工厂", 1.0),
                ("工厂直供", 0.9),
                ("生产加工", 0.8),
                ("自有工厂", 1.0),
                ("支持OEM", 0.6),
                ("支持ODM", 0.6),
                ("可定制", 0.4),
            ]),
            negative: phrases(&[("贸易", -0.6), ("批发", -0.4), ("代理", -0.6)]),
            trust: TrustWeights {
                audited: 0.2,
                years_weight: 0.02,
            },
            audit_tags: default_audit_tags(),
        }
    }
}

/// Load and validate classifier rules from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scoring_rules(path: &Path) -> Result<ScoringRules, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let rules: ScoringRules = serde_yaml::from_str(&content)?;

    validate_rules(&rules)?;

    Ok(rules)
}

fn validate_rules(rules: &ScoringRules) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&rules.threshold) {
        return Err(ConfigError::Validation(format!(
            "threshold {} must be within [0, 1]",
            rules.threshold
        )));
    }

    if !rules.trust.audited.is_finite() || !rules.trust.years_weight.is_finite() {
        return Err(ConfigError::Validation(
            "trust weights must be finite numbers".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in rules.positive.iter().chain(&rules.negative) {
        if entry.phrase.trim().is_empty() {
            return Err(ConfigError::Validation(
                "rule phrase must be non-empty".to_string(),
            ));
        }
        if !entry.weight.is_finite() {
            return Err(ConfigError::Validation(format!(
                "rule '{}' has non-finite weight",
                entry.phrase
            )));
        }
        if !seen.insert(entry.phrase.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate rule phrase: '{}'",
                entry.phrase
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
