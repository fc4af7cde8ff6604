//! First-match-wins response selection over a [`RuleTable`].

use crate::rules::{Rule, RuleTable};

/// The rule chosen for a query, and where it sits in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub index: usize,
    pub rule: &'a Rule,
}

impl<'a> Selection<'a> {
    pub fn response(&self) -> &'a str {
        self.rule.response()
    }

    pub fn is_fallback(&self) -> bool {
        self.rule.is_catch_all()
    }
}

/// Lower-case a query for comparison. The caller's string is left untouched.
pub fn normalize(query: &str) -> String {
    query.to_lowercase()
}

/// Return the first rule in `rules` whose keywords all occur in `query`.
///
/// Works on any ordered slice; `None` only when the slice has no catch-all
/// and nothing matched.
pub fn first_match<'a>(query: &str, rules: &'a [Rule]) -> Option<Selection<'a>> {
    let normalized = normalize(query);
    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches(&normalized))
        .map(|(index, rule)| Selection { index, rule })
}

/// Deterministic keyword matcher. Total: every query gets an answer.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    table: RuleTable,
}

impl Matcher {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Pick the rule for `query`, falling back to the table's catch-all.
    pub fn select(&self, query: &str) -> Selection<'_> {
        let selection = first_match(query, self.table.entries()).unwrap_or_else(|| Selection {
            index: self.table.len() - 1,
            rule: self.table.fallback(),
        });
        tracing::debug!(
            rule = selection.rule.name(),
            index = selection.index,
            fallback = selection.is_fallback(),
            "Rule selected"
        );
        selection
    }

    /// Response text for `query`.
    pub fn respond(&self, query: &str) -> &str {
        self.select(query).response()
    }
}

// =============================================================================
// Tests
// =============================================================================
