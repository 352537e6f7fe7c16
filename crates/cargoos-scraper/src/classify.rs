//! Weighted lexical factory classifier.
//!
//! Sums the weights of every rule phrase found in the listing title and
//! tags, maps the sum onto a `[0, 1]` confidence, and blends in trust
//! signals (audit badge, years on the marketplace) for the rank score.

use std::path::Path;

use cargoos_core::{load_scoring_rules, ScoringRules};

/// Classification of one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_factory: bool,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// In `[0, 100]`.
    pub score: f64,
    /// `"+phrase"` for each positive rule that fired, then the bare phrase
    /// for each negative rule.
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: ScoringRules,
}

impl Classifier {
    #[must_use]
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    /// Load rules from `path`, falling back to the built-in table.
    ///
    /// A missing or invalid rules file is logged and never fails the caller.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match load_scoring_rules(path) {
            Ok(rules) => {
                tracing::debug!(path = %path.display(), "loaded scoring rules");
                Self::new(rules)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "scoring rules unavailable; using built-in defaults"
                );
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Whether any tag is one of the configured audit badges.
    #[must_use]
    pub fn is_audited(&self, tags: &[String]) -> bool {
        tags.iter()
            .any(|tag| self.rules.audit_tags.iter().any(|a| a == tag))
    }

    #[must_use]
    pub fn classify(
        &self,
        title: &str,
        tags: &[String],
        years_active: Option<i32>,
        audited: bool,
    ) -> Classification {
        let text = format!("{title} {}", tags.join(" "));

        let mut fit = 0.0;
        let mut evidence = Vec::new();
        for rule in &self.rules.positive {
            if text.contains(&rule.phrase) {
                fit += rule.weight;
                evidence.push(format!("+{}", rule.phrase));
            }
        }
        for rule in &self.rules.negative {
            if text.contains(&rule.phrase) {
                fit += rule.weight;
                evidence.push(rule.phrase.clone());
            }
        }

        let confidence = clamp_unit((fit + 1.0) / 2.0);
        let is_factory = confidence >= self.rules.threshold;

        let audited_bonus = if audited { self.rules.trust.audited } else { 0.0 };
        let years = f64::from(years_active.unwrap_or(0).max(0));
        let score = clamp_unit(confidence + audited_bonus + years * self.rules.trust.years_weight) * 100.0;

        Classification {
            is_factory,
            confidence,
            score,
            evidence,
        }
    }
}

/// Clamp to `[0, 1]`; NaN maps to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use cargoos_core::WeightedPhrase;

    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn factory_listing_scores_high_with_evidence_in_rule_order() {
        let c = Classifier::default();
        let result = c.classify(
            "源头工厂 塑料瓶 OEM ODM",
            &tags(&["源头工厂", "支持OEM"]),
            Some(5),
            false,
        );
        // fit = 1.0 + 0.6 -> confidence clamps to 1.0
        assert!(approx(result.confidence, 1.0));
        assert!(result.is_factory);
        assert!(approx(result.score, 100.0));
        assert_eq!(result.evidence, vec!["+源头工厂", "+支持OEM"]);
    }

    #[test]
    fn trading_company_is_not_a_factory() {
        let c = Classifier::default();
        let result = c.classify("贸易公司 批发 帽子", &tags(&["批发"]), Some(2), false);
        // fit = -0.6 - 0.4 = -1.0 -> confidence 0
        assert!(approx(result.confidence, 0.0));
        assert!(!result.is_factory);
        assert!(approx(result.score, 4.0));
        assert_eq!(result.evidence, vec!["贸易", "批发"]);
    }

    #[test]
    fn neutral_listing_sits_at_half_confidence() {
        let c = Classifier::default();
        let result = c.classify("塑料瓶", &[], None, true);
        assert!(approx(result.confidence, 0.5));
        assert!(!result.is_factory);
        assert!(approx(result.score, 70.0));
        assert!(result.evidence.is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut rules = ScoringRules::default();
        rules.positive = vec![WeightedPhrase {
            phrase: "工厂".to_string(),
            weight: 0.2,
        }];
        let c = Classifier::new(rules);
        // confidence = (0.2 + 1) / 2 = 0.6
        let result = c.classify("工厂", &[], None, false);
        assert!(result.is_factory);
    }

    #[test]
    fn negative_years_are_treated_as_zero() {
        let c = Classifier::default();
        let with_negative = c.classify("塑料瓶", &[], Some(-40), false);
        let with_none = c.classify("塑料瓶", &[], None, false);
        assert!(approx(with_negative.score, with_none.score));
    }

    #[test]
    fn bounds_hold_for_extreme_inputs() {
        let mut rules = ScoringRules::default();
        rules.trust.years_weight = 10.0;
        let c = Classifier::new(rules);
        let all_positive = tags(&["源头工厂", "工厂直供", "生产加工", "自有工厂", "可定制"]);
        for (title, tag_list, years, audited) in [
            ("", vec![], None, false),
            ("贸易 批发 代理", tags(&["贸易"]), Some(i32::MIN), false),
            ("源头工厂", all_positive.clone(), Some(i32::MAX), true),
            ("", all_positive, Some(0), true),
        ] {
            let result = c.classify(title, &tag_list, years, audited);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert!((0.0..=100.0).contains(&result.score));
        }
    }

    #[test]
    fn evidence_length_matches_rules_fired() {
        let c = Classifier::default();
        let result = c.classify("工厂直供 可定制 代理", &tags(&["实力商家"]), None, true);
        assert_eq!(result.evidence, vec!["+工厂直供", "+可定制", "代理"]);
    }

    #[test]
    fn audited_detection_uses_audit_tags() {
        let c = Classifier::default();
        assert!(c.is_audited(&tags(&["支持OEM", "实地认证"])));
        assert!(c.is_audited(&tags(&["实力商家"])));
        assert!(!c.is_audited(&tags(&["支持OEM"])));
        assert!(!c.is_audited(&[]));
    }

    #[test]
    fn missing_rules_file_falls_back_to_defaults() {
        let c = Classifier::from_path(Path::new("/nonexistent/scoring_rules.yaml"));
        assert_eq!(c.rules(), &ScoringRules::default());
    }

    #[test]
    fn invalid_rules_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "threshold: 7\ntrust: {audited: 0, years_weight: 0}\n")
            .expect("write");
        let c = Classifier::from_path(&path);
        assert_eq!(c.rules(), &ScoringRules::default());
    }
}
