use std::collections::{HashMap, HashSet};

use super::NodeId;
use crate::facts::ClassRole;

/// Conventional role suffixes removed before fuzzy name matching.
pub const ROLE_SUFFIXES: &[&str] = &["service", "manager", "repository", "controller"];

/// A registered class with its match-ready name forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: NodeId,
    pub name: String,
    pub file: String,
    pub role: ClassRole,
    lower: String,
    stripped: String,
}

impl RegistryEntry {
    pub fn new(id: NodeId, name: &str, file: &str, role: ClassRole) -> Self {
        let lower = name.to_lowercase();
        let stripped = strip_role_suffixes(&lower).to_string();
        Self {
            id,
            name: name.to_string(),
            file: file.to_string(),
            role,
            lower,
            stripped,
        }
    }

    /// Lowercased class name.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Lowercased class name without role suffixes; may be empty.
    pub fn stripped(&self) -> &str {
        &self.stripped
    }
}

/// Collects classes during registration. Freezing it into a
/// [`GlobalRegistry`] ends registration.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistryEntry>,
    seen: HashSet<NodeId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: NodeId, name: &str, file: &str, role: ClassRole) {
        if !self.seen.insert(id) {
            return;
        }
        self.entries.push(RegistryEntry::new(id, name, file, role));
    }

    pub fn build(self) -> GlobalRegistry {
        let by_id = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id, idx))
            .collect();
        GlobalRegistry {
            entries: self.entries,
            by_id,
        }
    }
}

/// Project-wide class table, in registration order. Read-only once built.
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    entries: Vec<RegistryEntry>,
    by_id: HashMap<NodeId, usize>,
}

impl GlobalRegistry {
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&RegistryEntry> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }
}

/// Removes role suffixes from the end of a lowercased name, repeatedly:
/// `userservicemanager` becomes `user`.
pub fn strip_role_suffixes(lower: &str) -> &str {
    let mut name = lower;
    'strip: loop {
        for suffix in ROLE_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped.trim_end_matches('_');
                continue 'strip;
            }
        }
        break;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_role_suffixes() {
        assert_eq!(strip_role_suffixes("emailservice"), "email");
        assert_eq!(strip_role_suffixes("userservicemanager"), "user");
        assert_eq!(strip_role_suffixes("ordercontroller"), "order");
        assert_eq!(strip_role_suffixes("database"), "database");
        assert_eq!(strip_role_suffixes("service"), "");
        assert_eq!(strip_role_suffixes("servicelocator"), "servicelocator");
        assert_eq!(strip_role_suffixes("audit_log_service"), "audit_log");
    }

    #[test]
    fn test_registration_order_and_get() {
        let mut builder = RegistryBuilder::new();
        builder.register(NodeId(3), "UserService", "a.py", ClassRole::Service);
        builder.register(NodeId(1), "Database", "b.py", ClassRole::Class);
        builder.register(NodeId(5), "UserService", "c.py", ClassRole::Service);
        builder.register(NodeId(3), "UserService", "a.py", ClassRole::Service);
        let registry = builder.build();

        assert_eq!(registry.len(), 3);
        let names: Vec<_> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["UserService", "Database", "UserService"]);
        assert_eq!(registry.get(NodeId(3)).unwrap().file, "a.py");
        assert_eq!(registry.get(NodeId(1)).unwrap().file, "b.py");
        assert!(registry.get(NodeId(2)).is_none());
    }

    #[test]
    fn test_entry_name_forms() {
        let entry = RegistryEntry::new(NodeId(0), "EmailService", "mail.py", ClassRole::Service);
        assert_eq!(entry.lower(), "emailservice");
        assert_eq!(entry.stripped(), "email");
    }
}
