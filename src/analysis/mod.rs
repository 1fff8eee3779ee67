//! Content threat analysis
//!
//! Rule-based scoring of free text against the threat categories. Each
//! category combines keyword hits, regex pattern hits and a TF-IDF
//! similarity to a small reference corpus into a confidence in `[0, 1]`.
//! Links found in the text are inspected separately and raise phishing
//! confidence.
//!
//! Corpus similarity only corroborates: a category needs at least one
//! keyword, pattern or link match before it can become the primary
//! category or contribute to the overall risk.

pub mod rules;
pub mod tfidf;

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::models::threat::MAX_CONTENT_LENGTH;
use crate::models::{Indicator, IndicatorKind, Severity, ThreatCategory};
use rules::{CategoryRule, CompiledRule, DEFAULT_RULES, GENERAL_RECOMMENDATIONS};
use tfidf::{tokenize, TfIdfIndex};

pub const KEYWORD_WEIGHT: f64 = 0.15;
pub const PATTERN_WEIGHT: f64 = 0.25;
pub const TFIDF_WEIGHT: f64 = 0.35;

/// Phishing boost per suspicious link feature
pub const LINK_BOOST: f64 = 0.1;
pub const MAX_LINK_BOOST: f64 = 0.3;

/// Minimum risk for a text to count as a threat
pub const THREAT_THRESHOLD: f64 = 0.3;

/// Verdict for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ThreatCategory,
    pub match_count: usize,
    pub keyword_hits: usize,
    pub pattern_hits: usize,
    pub tfidf_score: f64,
    pub confidence: f64,
    pub severity: Severity,
}

/// Full analysis of one text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub is_threat: bool,
    pub primary_category: Option<ThreatCategory>,
    pub risk_score: f64,
    pub severity: Severity,
    pub scores: Vec<CategoryScore>,
    pub indicators: Vec<Indicator>,
    pub links: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisReport {
    pub fn score_for(&self, category: ThreatCategory) -> Option<&CategoryScore> {
        self.scores.iter().find(|s| s.category == category)
    }
}

/// Analysis request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
}

/// Analysis errors
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Content is empty")]
    EmptyInput,

    #[error("Content is {len} characters, maximum is {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Heuristic classifier built once and shared between requests
#[derive(Debug, Clone)]
pub struct ThreatAnalyzer {
    rules: Vec<CompiledRule>,
    index: TfIdfIndex,
    link_pattern: Regex,
    max_length: usize,
}

impl ThreatAnalyzer {
    /// Analyzer over the built-in rules
    pub fn new() -> Result<Self, AnalysisError> {
        Self::with_rules(DEFAULT_RULES)
    }

    pub fn with_rules(rules: &[CategoryRule]) -> Result<Self, AnalysisError> {
        let compiled = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let index = TfIdfIndex::build(rules.iter().flat_map(|rule| {
            rule.reference_corpus
                .iter()
                .map(move |document| (rule.category, *document))
        }));

        Ok(Self {
            rules: compiled,
            index,
            link_pattern: Regex::new(r#"(?i)\bhttps?://[^\s<>"']+"#)?,
            max_length: MAX_CONTENT_LENGTH,
        })
    }

    /// Categories this analyzer scores, in declaration order
    pub fn categories(&self) -> Vec<ThreatCategory> {
        self.rules.iter().map(|r| r.category).collect()
    }

    /// Score `text` against every category
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let len = text.chars().count();
        if len > self.max_length {
            return Err(AnalysisError::InputTooLong {
                len,
                max: self.max_length,
            });
        }

        let normalized = normalize(text);
        let tokens = tokenize(text);
        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

        let mut indicators = Vec::new();
        let mut scores = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let mut keyword_hits = 0;
            for keyword in rule.keywords {
                if keyword_matches(keyword, &normalized, &token_set) {
                    keyword_hits += 1;
                    indicators.push(Indicator {
                        kind: IndicatorKind::Keyword,
                        category: rule.category,
                        detail: (*keyword).to_string(),
                    });
                }
            }

            let mut pattern_hits = 0;
            for (name, pattern) in &rule.patterns {
                if pattern.is_match(text) {
                    pattern_hits += 1;
                    indicators.push(Indicator {
                        kind: IndicatorKind::Pattern,
                        category: rule.category,
                        detail: (*name).to_string(),
                    });
                }
            }

            let tfidf_score = self.index.score(rule.category, &tokens);
            let raw = keyword_hits as f64 * KEYWORD_WEIGHT
                + pattern_hits as f64 * PATTERN_WEIGHT
                + tfidf_score * TFIDF_WEIGHT;
            let confidence = (raw * rule.weight).clamp(0.0, 1.0);

            scores.push(CategoryScore {
                category: rule.category,
                match_count: keyword_hits + pattern_hits,
                keyword_hits,
                pattern_hits,
                tfidf_score,
                confidence,
                severity: Severity::from_confidence(confidence),
            });
        }

        let (links, link_indicators) = self.inspect_links(text);
        if !link_indicators.is_empty() {
            let boost = (link_indicators.len() as f64 * LINK_BOOST).min(MAX_LINK_BOOST);
            if let Some(phishing) = scores
                .iter_mut()
                .find(|s| s.category == ThreatCategory::Phishing)
            {
                phishing.confidence = (phishing.confidence + boost).min(1.0);
                phishing.match_count += link_indicators.len();
                phishing.severity = Severity::from_confidence(phishing.confidence);
            }
            indicators.extend(link_indicators);
        }

        let primary = primary_category(&scores);
        let risk_score = scores
            .iter()
            .filter(|s| s.match_count > 0)
            .map(|s| s.confidence)
            .fold(0.0, f64::max);
        let recommendations = match primary {
            Some(category) => self
                .rules
                .iter()
                .find(|r| r.category == category)
                .map(|r| r.recommendations)
                .unwrap_or(GENERAL_RECOMMENDATIONS),
            None => GENERAL_RECOMMENDATIONS,
        };

        Ok(AnalysisReport {
            is_threat: risk_score >= THREAT_THRESHOLD,
            primary_category: primary,
            risk_score,
            severity: Severity::from_confidence(risk_score),
            scores,
            indicators,
            links,
            recommendations: recommendations.iter().map(|r| (*r).to_string()).collect(),
        })
    }

    /// Extract links and flag suspicious hosts
    fn inspect_links(&self, text: &str) -> (Vec<String>, Vec<Indicator>) {
        let mut links = Vec::new();
        let mut indicators = Vec::new();

        for found in self.link_pattern.find_iter(text) {
            let raw = found.as_str().trim_end_matches(['.', ',', ')', ';', '!', '?']);
            let Ok(url) = Url::parse(raw) else {
                continue;
            };
            links.push(url.to_string());

            let mut flag = |detail: String| {
                indicators.push(Indicator {
                    kind: IndicatorKind::Link,
                    category: ThreatCategory::Phishing,
                    detail,
                });
            };

            if !url.username().is_empty() || url.password().is_some() || has_userinfo(raw) {
                flag(format!("credentials_in_url:{}", raw));
            }

            match url.host() {
                Some(Host::Ipv4(ip)) => flag(format!("ip_address_host:{}", ip)),
                Some(Host::Ipv6(ip)) => flag(format!("ip_address_host:{}", ip)),
                Some(Host::Domain(domain)) => {
                    let domain = domain.to_ascii_lowercase();
                    if domain.split('.').any(|label| label.starts_with("xn--")) {
                        flag(format!("punycode_domain:{}", domain));
                    }
                    if let Some(tld) = domain.rsplit('.').next() {
                        if rules::SUSPICIOUS_TLDS.contains(&tld) {
                            flag(format!("suspicious_tld:{}", domain));
                        }
                    }
                    if rules::URL_SHORTENERS.contains(&domain.as_str()) {
                        flag(format!("shortened_link:{}", domain));
                    }
                }
                None => {}
            }
        }

        (links, indicators)
    }
}

/// `@` before the host, including an empty userinfo the parser drops
fn has_userinfo(raw: &str) -> bool {
    let authority = raw
        .split_once("://")
        .map_or(raw, |(_, rest)| rest)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    authority.contains('@')
}

/// Lowercase with whitespace runs collapsed to single spaces
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Single words match whole tokens; phrases match as substrings
fn keyword_matches(keyword: &str, normalized: &str, tokens: &HashSet<&str>) -> bool {
    if keyword.chars().all(char::is_alphanumeric) {
        tokens.contains(keyword)
    } else {
        normalized.contains(keyword)
    }
}

/// Highest confidence among matched categories; ties go to the earlier category
fn primary_category(scores: &[CategoryScore]) -> Option<ThreatCategory> {
    let mut best: Option<&CategoryScore> = None;
    for score in scores {
        if score.match_count == 0 {
            continue;
        }
        match best {
            Some(current) if current.confidence >= score.confidence => {}
            _ => best = Some(score),
        }
    }
    best.map(|s| s.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ThreatAnalyzer {
        ThreatAnalyzer::new().unwrap()
    }

    #[test]
    fn test_phishing_message() {
        let report = analyzer()
            .analyze(
                "URGENT: Your account has been suspended. Verify your password immediately at http://192.168.4.20/login",
            )
            .unwrap();

        assert!(report.is_threat);
        assert_eq!(report.primary_category, Some(ThreatCategory::Phishing));
        assert!(report.severity >= Severity::High);

        let phishing = report.score_for(ThreatCategory::Phishing).unwrap();
        assert!(phishing.keyword_hits >= 3);
        assert!(phishing.pattern_hits >= 2);
        assert_eq!(report.links.len(), 1);
        assert!(report
            .indicators
            .iter()
            .any(|i| i.kind == IndicatorKind::Link && i.detail.starts_with("ip_address_host")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("passwords")));
    }

    #[test]
    fn test_benign_message() {
        let report = analyzer()
            .analyze("See you at soccer practice tomorrow, bring your water bottle.")
            .unwrap();

        assert!(!report.is_threat);
        assert_eq!(report.primary_category, None);
        assert_eq!(report.severity, Severity::Low);
        assert!(report.indicators.is_empty());
        assert_eq!(report.recommendations.len(), GENERAL_RECOMMENDATIONS.len());
    }

    #[test]
    fn test_predator_message() {
        let report = analyzer()
            .analyze("This is our secret, don't tell your parents. Are you home alone? Send me a photo.")
            .unwrap();

        assert!(report.is_threat);
        assert_eq!(report.primary_category, Some(ThreatCategory::Predator));
        assert!(report.severity >= Severity::High);
    }

    #[test]
    fn test_scam_message() {
        let report = analyzer()
            .analyze("Congratulations winner! Claim your $5,000 lottery prize, just pay a fee with gift cards.")
            .unwrap();

        assert_eq!(report.primary_category, Some(ThreatCategory::Scam));
        assert!(report.is_threat);
    }

    #[test]
    fn test_malware_message() {
        let report = analyzer()
            .analyze("Your computer is infected! Download cleaner.exe and install it now.")
            .unwrap();

        assert_eq!(report.primary_category, Some(ThreatCategory::Malware));
        let malware = report.score_for(ThreatCategory::Malware).unwrap();
        assert!(malware.pattern_hits >= 2);
    }

    #[test]
    fn test_link_indicators_boost_phishing() {
        let report = analyzer()
            .analyze("look at this https://xn--mnchen-3ya.xyz/offer and https://bit.ly/abc")
            .unwrap();

        let details: Vec<&str> = report
            .indicators
            .iter()
            .filter(|i| i.kind == IndicatorKind::Link)
            .map(|i| i.detail.as_str())
            .collect();
        assert!(details.iter().any(|d| d.starts_with("punycode_domain")));
        assert!(details.iter().any(|d| d.starts_with("suspicious_tld")));
        assert!(details.iter().any(|d| d.starts_with("shortened_link")));

        let phishing = report.score_for(ThreatCategory::Phishing).unwrap();
        assert!(phishing.confidence >= MAX_LINK_BOOST - 1e-9);
    }

    #[test]
    fn test_confidence_bounds_and_severity_agree() {
        let text = "verify password login urgent suspended credentials click here security alert \
                    immediately http://1.2.3.4 your account has been suspended enter your password";
        let report = analyzer().analyze(text).unwrap();
        for score in &report.scores {
            assert!((0.0..=1.0).contains(&score.confidence));
            assert_eq!(score.severity, Severity::from_confidence(score.confidence));
        }
        assert_eq!(report.risk_score, 1.0);
        assert_eq!(report.severity, Severity::Critical);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            analyzer().analyze("   \n\t"),
            Err(AnalysisError::EmptyInput)
        ));
        let long = "a ".repeat(MAX_CONTENT_LENGTH);
        assert!(matches!(
            analyzer().analyze(&long),
            Err(AnalysisError::InputTooLong { .. })
        ));
    }

    #[test]
    fn test_punctuation_only_is_clean() {
        let report = analyzer().analyze("?!?! ... ---").unwrap();
        assert!(!report.is_threat);
        assert_eq!(report.primary_category, None);
        assert!(report.scores.iter().all(|s| s.tfidf_score == 0.0));
    }

    #[test]
    fn test_keyword_matching_modes() {
        let normalized = normalize("Please   CLICK here now");
        let tokens: HashSet<&str> = ["please", "click", "here", "now"].into_iter().collect();
        assert!(keyword_matches("click here", &normalized, &tokens));
        assert!(keyword_matches("now", &normalized, &tokens));
        // single words do not match inside longer words
        assert!(!keyword_matches("lick", &normalized, &tokens));
    }

    #[test]
    fn test_short_everyday_texts_are_clean() {
        let analyzer = analyzer();
        for text in [
            "Let's meet at the library to study",
            "Please update the document",
            "Are you free right now?",
            "Can you send me the homework answers?",
            "Happy birthday! See you at the party",
            "Mom says dinner is ready",
        ] {
            let report = analyzer.analyze(text).unwrap();
            assert!(!report.is_threat, "{} flagged with risk {}", text, report.risk_score);
            assert_eq!(report.primary_category, None, "{}", text);
            assert_eq!(report.severity, Severity::Low, "{}", text);
            for score in &report.scores {
                assert!(score.confidence < THREAT_THRESHOLD, "{} scored {:?}", text, score);
            }
        }
    }

    #[test]
    fn test_similarity_alone_never_sets_primary() {
        let score = CategoryScore {
            category: ThreatCategory::Predator,
            match_count: 0,
            keyword_hits: 0,
            pattern_hits: 0,
            tfidf_score: 1.0,
            confidence: 0.42,
            severity: Severity::Medium,
        };
        assert_eq!(primary_category(&[score]), None);
    }

    #[test]
    fn test_credentials_in_url() {
        let analyzer = analyzer();
        for text in [
            "log in at http://bank.com@evil.example/login",
            "log in at http://:secret@evil.example/",
            "log in at http://@evil.example/",
        ] {
            let report = analyzer.analyze(text).unwrap();
            assert!(
                report
                    .indicators
                    .iter()
                    .any(|i| i.kind == IndicatorKind::Link && i.detail.starts_with("credentials_in_url")),
                "{}",
                text
            );
        }

        let report = analyzer.analyze("docs at https://example.com/a@b").unwrap();
        assert!(!report
            .indicators
            .iter()
            .any(|i| i.detail.starts_with("credentials_in_url")));
    }

    #[test]
    fn test_has_userinfo() {
        assert!(has_userinfo("http://@evil.example/"));
        assert!(has_userinfo("http://user:pw@evil.example"));
        assert!(!has_userinfo("https://example.com/path@x"));
        assert!(!has_userinfo("https://example.com?to=a@b"));
    }

    #[test]
    fn test_primary_tie_prefers_earlier_category() {
        let score = |category, confidence| CategoryScore {
            category,
            match_count: 1,
            keyword_hits: 1,
            pattern_hits: 0,
            tfidf_score: 0.0,
            confidence,
            severity: Severity::from_confidence(confidence),
        };
        let scores = vec![
            score(ThreatCategory::Phishing, 0.5),
            score(ThreatCategory::Scam, 0.5),
        ];
        assert_eq!(primary_category(&scores), Some(ThreatCategory::Phishing));
    }
}
