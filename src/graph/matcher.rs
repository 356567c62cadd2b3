//! Name-similarity strategies that map a raw dependency candidate onto a
//! registered class. Candidates are compared lowercased.

use super::registry::{GlobalRegistry, RegistryEntry};

pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `candidate` is already lowercased.
    fn matches(&self, candidate: &str, entry: &RegistryEntry) -> bool;
}

/// Case-insensitive equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactName;

impl MatchStrategy for ExactName {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, candidate: &str, entry: &RegistryEntry) -> bool {
        candidate == entry.lower()
    }
}

/// Substring containment in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Containment;

impl MatchStrategy for Containment {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn matches(&self, candidate: &str, entry: &RegistryEntry) -> bool {
        entry.lower().contains(candidate) || candidate.contains(entry.lower())
    }
}

/// Containment against the class name with role suffixes removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrippedContainment;

impl MatchStrategy for StrippedContainment {
    fn name(&self) -> &'static str {
        "stripped-containment"
    }

    fn matches(&self, candidate: &str, entry: &RegistryEntry) -> bool {
        let stripped = entry.stripped();
        !stripped.is_empty() && (candidate.contains(stripped) || stripped.contains(candidate))
    }
}

/// Short abbreviations (`db`, `repo`) that prefix or occur in the stripped name.
#[derive(Debug, Clone, Copy)]
pub struct ShortToken {
    pub max_len: usize,
}

impl Default for ShortToken {
    fn default() -> Self {
        Self { max_len: 4 }
    }
}

impl MatchStrategy for ShortToken {
    fn name(&self) -> &'static str {
        "short-token"
    }

    fn matches(&self, candidate: &str, entry: &RegistryEntry) -> bool {
        let stripped = entry.stripped();
        candidate.chars().count() <= self.max_len
            && !stripped.is_empty()
            && (stripped.starts_with(candidate) || stripped.contains(candidate))
    }
}

/// Result of resolving one candidate.
#[derive(Debug, Clone)]
pub struct MatchOutcome<'r> {
    pub target: &'r RegistryEntry,
    pub strategy: &'static str,
    /// Other classes the deciding strategy also accepted, in registry order.
    pub alternatives: Vec<&'r RegistryEntry>,
}

impl MatchOutcome<'_> {
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

/// Ordered strategies. The first strategy accepting any class decides, and
/// among the classes it accepts the first in registry order wins.
pub struct MatchLadder {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl Default for MatchLadder {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ExactName),
            Box::new(Containment),
            Box::new(StrippedContainment),
            Box::new(ShortToken::default()),
        ])
    }
}

impl MatchLadder {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves `candidate` for the class `source`, which never matches
    /// itself nor any class of the same name.
    pub fn resolve<'r>(
        &self,
        candidate: &str,
        source: &RegistryEntry,
        registry: &'r GlobalRegistry,
    ) -> Option<MatchOutcome<'r>> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        let eligible: Vec<&RegistryEntry> = registry
            .entries()
            .iter()
            .filter(|entry| entry.id != source.id && entry.lower() != source.lower())
            .collect();

        self.strategies.iter().find_map(|strategy| {
            let mut accepted = eligible
                .iter()
                .copied()
                .filter(|entry| strategy.matches(&candidate, entry));
            let target = accepted.next()?;
            Some(MatchOutcome {
                target,
                strategy: strategy.name(),
                alternatives: accepted.collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ClassRole;
    use crate::graph::registry::RegistryBuilder;
    use crate::graph::NodeId;

    fn entry(name: &str) -> RegistryEntry {
        RegistryEntry::new(NodeId(999), name, "other.py", ClassRole::Class)
    }

    fn registry(names: &[&str]) -> GlobalRegistry {
        let mut builder = RegistryBuilder::new();
        for (idx, name) in names.iter().enumerate() {
            builder.register(NodeId(idx), name, "x.py", ClassRole::Class);
        }
        builder.build()
    }

    #[test]
    fn test_exact_name() {
        assert!(ExactName.matches("userrepository", &entry("UserRepository")));
        assert!(!ExactName.matches("user", &entry("UserRepository")));
    }

    #[test]
    fn test_containment_both_directions() {
        assert!(Containment.matches("user", &entry("UserRepository")));
        assert!(Containment.matches("primary_database_pool", &entry("Database")));
        assert!(!Containment.matches("db", &entry("Database")));
    }

    #[test]
    fn test_stripped_containment() {
        assert!(StrippedContainment.matches("email_service", &entry("EmailService")));
        assert!(StrippedContainment.matches("auth_service", &entry("AuthService")));
        assert!(!StrippedContainment.matches("db", &entry("Database")));
        assert!(!StrippedContainment.matches("anything", &entry("Service")));
    }

    #[test]
    fn test_short_token() {
        let short = ShortToken::default();
        assert!(!short.matches("repo", &entry("RepositoryManager")));
        assert!(short.matches("ord", &entry("OrderService")));
        assert!(!short.matches("orders", &entry("OrderService")));
        assert!(!short.matches("db", &entry("Database")));
    }

    #[test]
    fn test_ladder_order_and_first_match() {
        let registry = registry(&["UserProfile", "User", "Database"]);
        let source = entry("Controller");
        let ladder = MatchLadder::default();

        let outcome = ladder.resolve("user", &source, &registry).unwrap();
        assert_eq!(outcome.target.name, "User");
        assert_eq!(outcome.strategy, "exact");
        assert!(!outcome.is_ambiguous());

        let outcome = ladder.resolve("profile", &source, &registry).unwrap();
        assert_eq!(outcome.target.name, "UserProfile");
        assert_eq!(outcome.strategy, "containment");
    }

    #[test]
    fn test_ladder_reports_alternatives() {
        let registry = registry(&["PaymentGateway", "PaymentLedger"]);
        let outcome = MatchLadder::default()
            .resolve("payment", &entry("Checkout"), &registry)
            .unwrap();
        assert_eq!(outcome.target.name, "PaymentGateway");
        assert_eq!(outcome.alternatives.len(), 1);
        assert_eq!(outcome.alternatives[0].name, "PaymentLedger");
    }

    #[test]
    fn test_ladder_never_matches_source() {
        let registry = registry(&["UserService"]);
        let source = registry.entries()[0].clone();
        assert!(MatchLadder::default()
            .resolve("user_service", &source, &registry)
            .is_none());
    }

    #[test]
    fn test_ladder_skips_empty_candidate() {
        let registry = registry(&["A"]);
        assert!(MatchLadder::default().resolve("  ", &entry("B"), &registry).is_none());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            MatchLadder::default().strategy_names(),
            vec!["exact", "containment", "stripped-containment", "short-token"]
        );
    }
}
