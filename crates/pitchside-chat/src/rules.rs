//! Ordered keyword rule table.
//!
//! A rule matches when every one of its keywords is a substring of the
//! lower-cased query. Rule order is part of the contract: the first match
//! wins, so overlapping rules are resolved purely by position. The table
//! always ends in a catch-all fallback, which keeps matching total.

use serde::{Deserialize, Serialize};

use pitchside_core::config::{ChatConfig, RuleConfig};

use crate::error::RuleError;

/// Name given to the trailing catch-all entry.
pub const FALLBACK_RULE_NAME: &str = "fallback";

// =============================================================================
// Built-in football rules
// =============================================================================

const DERBY_RESPONSE: &str = "Based on current form analysis:\n\n🎯 **Prediction**: Galatasaray 65% chance to win\n⚽ **Both teams to score**: Very likely (85%)\n📊 **Over 2.5 goals**: 70% probability\n⚠️ **Key factors**: Derby intensity, home advantage for Galatasaray\n🏥 **Injuries**: Fenerbahçe missing 2 key defenders";

const MAN_UTD_RESPONSE: &str = "Manchester United Analysis:\n\n📋 **Key Missing Players**: Marcus Rashford (hamstring), Lisandro Martínez (foot injury)\n📈 **Current Form**: W-D-L-W-D (mixed)\n🎯 **Attack Rating**: 7.2/10\n🛡️ **Defense Rating**: 6.1/10\n💡 **Recommendation**: Consider their vulnerability in defense with Martinez out";

const LIVERPOOL_RESPONSE: &str = "Liverpool Current Analysis:\n\n🔥 **Form**: Excellent - 8 wins in last 10 games\n⚽ **Goals**: Averaging 2.4 goals per game\n🛡️ **Clean Sheets**: 6 in last 10 matches\n👑 **Key Players**: Salah in brilliant form (12 goals in 8 games)\n📊 **Expected Performance**: Very high confidence in upcoming matches";

const CHELSEA_ARSENAL_RESPONSE: &str = "Chelsea vs Arsenal Prediction:\n\n🎯 **Most Likely**: Draw or Arsenal slight edge\n📊 **Probability**: Arsenal 40%, Draw 35%, Chelsea 25%\n⚽ **Goals**: Both teams likely to score\n🔑 **Key Battle**: Midfield control will be decisive\n⚠️ **Watch Out**: Chelsea's inconsistent away form\n🏥 **Injuries**: Both teams relatively injury-free";

/// Answer returned when no keyword rule matches.
pub const DEFAULT_FALLBACK_RESPONSE: &str = "I've analyzed your question using real-time data and AI modeling:\n\n🎯 **Prediction**: Based on current form, head-to-head records, and tactical analysis\n📊 **Confidence Level**: High (78%)\n⚽ **Goal Expectation**: 2-3 goals likely\n🔑 **Key Factors**: Home advantage, recent form, and injury status\n💡 **Recommendation**: Monitor team news 2 hours before kickoff for final updates";

/// (name, keywords, response), in evaluation order.
///
/// "manchester united" and "man utd" are two rules sharing one answer since
/// a single rule only expresses all-of.
static FOOTBALL_RULES: &[(&str, &[&str], &str)] = &[
    ("galatasaray-fenerbahce", &["galatasaray", "fenerbahçe"], DERBY_RESPONSE),
    ("manchester-united", &["manchester united"], MAN_UTD_RESPONSE),
    ("man-utd", &["man utd"], MAN_UTD_RESPONSE),
    ("liverpool", &["liverpool"], LIVERPOOL_RESPONSE),
    ("chelsea-arsenal", &["chelsea", "arsenal"], CHELSEA_ARSENAL_RESPONSE),
];

// =============================================================================
// Rule
// =============================================================================

/// A keyword-set-to-response mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    name: String,
    /// Lower-cased required substrings. Empty only for the catch-all.
    keywords: Vec<String>,
    response: String,
}

impl Rule {
    /// Build a keyword rule. Keywords are lower-cased; duplicates collapse.
    pub fn new<I, S>(
        name: impl Into<String>,
        keywords: I,
        response: impl Into<String>,
    ) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let response = response.into();

        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref();
            if keyword.trim().is_empty() {
                return Err(RuleError::BlankKeyword(name));
            }
            let lower = keyword.to_lowercase();
            if !normalized.contains(&lower) {
                normalized.push(lower);
            }
        }

        if normalized.is_empty() {
            return Err(RuleError::EmptyKeywords(name));
        }
        if response.trim().is_empty() {
            return Err(RuleError::EmptyTemplate(name));
        }

        Ok(Self {
            name,
            keywords: normalized,
            response,
        })
    }

    fn catch_all(response: String) -> Self {
        Self {
            name: FALLBACK_RULE_NAME.to_string(),
            keywords: Vec::new(),
            response,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Text returned verbatim when this rule matches.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// True for the always-matching trailing entry.
    pub fn is_catch_all(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Check the rule against an already lower-cased query.
    pub fn matches(&self, normalized_query: &str) -> bool {
        self.keywords
            .iter()
            .all(|k| normalized_query.contains(k.as_str()))
    }
}

impl TryFrom<&RuleConfig> for Rule {
    type Error = RuleError;

    fn try_from(cfg: &RuleConfig) -> Result<Self, Self::Error> {
        Rule::new(cfg.name.clone(), &cfg.keywords, cfg.response.clone())
    }
}

// =============================================================================
// RuleTable
// =============================================================================

/// Immutable, ordered rule table ending in a catch-all fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from keyword rules followed by the fallback answer.
    pub fn new(rules: Vec<Rule>, fallback: impl Into<String>) -> Result<Self, RuleError> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(RuleError::EmptyFallback);
        }

        let mut entries = rules;
        entries.push(Rule::catch_all(fallback));
        Ok(Self { entries })
    }

    /// The built-in football analyst table.
    pub fn football() -> Self {
        let mut entries: Vec<Rule> = FOOTBALL_RULES
            .iter()
            .map(|(name, keywords, response)| Rule {
                name: (*name).to_string(),
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
                response: (*response).to_string(),
            })
            .collect();
        entries.push(Rule::catch_all(DEFAULT_FALLBACK_RESPONSE.to_string()));
        Self { entries }
    }

    /// Build the table described by the chat configuration.
    ///
    /// With no configured rules the built-in football rules are used; a
    /// configured fallback replaces the default answer either way.
    pub fn from_config(config: &ChatConfig) -> Result<Self, RuleError> {
        let fallback = config
            .fallback_response
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_RESPONSE.to_string());

        if config.rules.is_empty() {
            let mut table = Self::football();
            table.entries.pop();
            return Self::new(table.entries, fallback);
        }

        let rules = config
            .rules
            .iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = rules.len(), "Loaded rules from configuration");
        Self::new(rules, fallback)
    }

    /// All entries in evaluation order, fallback last.
    pub fn entries(&self) -> &[Rule] {
        &self.entries
    }

    /// The trailing catch-all.
    pub fn fallback(&self) -> &Rule {
        // `new` and `football` always push the catch-all last.
        &self.entries[self.entries.len() - 1]
    }

    /// Number of entries including the fallback.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: a table always holds its fallback.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::football()
    }
}

// =============================================================================
// Tests
// =============================================================================
