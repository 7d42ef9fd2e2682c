use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::rules::{Rule, RuleKey};

/// The set of configured rules, in registration order.
///
/// Mutations and matching both go through one reader-writer lock: matching
/// takes a read guard so concurrent lookups never block each other, while
/// add/remove take the write guard so no reader observes a half-updated
/// table.
///
/// Matching scans in two passes. The first pass considers only rules with
/// a literal host, the second admits wildcard-host rules, so a literal
/// rule wins over a wildcard one regardless of registration order. Within
/// a pass, the first registered candidate wins.
#[derive(Debug)]
pub struct RuleTable {
    rules: RwLock<Vec<Arc<Rule>>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self { rules: RwLock::new(Vec::new()) }
    }

    /// Inserts the rule unless one with an equal key is already present.
    /// Returns whether the rule was added.
    pub fn add_if_new(&self, rule: Rule) -> bool {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        if rules.iter().any(|existing| existing.key() == rule.key()) {
            debug!(rule = %rule.key(), "rule already present, not added");
            return false;
        }
        debug!(rule = %rule.key(), "rule added");
        rules.push(Arc::new(rule));
        true
    }

    /// Whether a rule with an equal key is present.
    pub fn exists(&self, key: &RuleKey) -> bool {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.iter().any(|rule| rule.key() == key)
    }

    /// Whether any rule listens on the given port.
    pub fn any_rule_for_port(&self, port: u16) -> bool {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.iter().any(|rule| rule.key().port() == port)
    }

    /// Removes the rule with this key. Returns whether one was present.
    pub fn remove(&self, key: &RuleKey) -> bool {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let before = rules.len();
        rules.retain(|rule| rule.key() != key);
        before != rules.len()
    }

    /// Removes every rule listening on the given port.
    pub fn remove_by_port(&self, port: u16) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        rules.retain(|rule| rule.key().port() != port);
    }

    pub fn remove_all(&self) {
        self.rules.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Resolves a request to the rule that should handle it, or `None`
    /// when nothing matches.
    pub fn match_rule(&self, host: &str, method: &str, path: &str, port: u16) -> Option<Arc<Rule>> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);

        rules
            .iter()
            .find(|rule| !rule.key().is_wildcard_host() && rule.key().matches(host, method, path, port))
            .or_else(|| {
                rules
                    .iter()
                    .find(|rule| rule.key().is_wildcard_host() && rule.key().matches(host, method, path, port))
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the current rules, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<Rule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}
