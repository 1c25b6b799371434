use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A node claimed by two or more distinct systems.
    SystemMismatch,
    /// A foreign key with an endpoint that resolves to no entity.
    MissingRelationshipTarget,
    /// A Linear assignment that references no known entity or attribute.
    UnassignedEntity,
    /// An attribute whose owning entity is unknown.
    OrphanAttribute,
}

impl FindingKind {
    pub const ALL: [FindingKind; 4] = [
        Self::SystemMismatch,
        Self::MissingRelationshipTarget,
        Self::UnassignedEntity,
        Self::OrphanAttribute,
    ];
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SystemMismatch => write!(f, "system_mismatch"),
            Self::MissingRelationshipTarget => write!(f, "missing_relationship_target"),
            Self::UnassignedEntity => write!(f, "unassigned_entity"),
            Self::OrphanAttribute => write!(f, "orphan_attribute"),
        }
    }
}

/// A non-fatal data-quality issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub ids: Vec<String>,
    pub message: String,
}

/// Accumulates findings across the builder and reconciler. Nothing is ever
/// removed; the collected list is handed whole to QA.
#[derive(Debug, Default)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: FindingKind, ids: Vec<String>, message: impl Into<String>) {
        let message = message.into();
        log::debug!("finding {kind}: {message}");
        self.items.push(Finding { kind, ids, message });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.items.iter().filter(|f| f.kind == kind).count()
    }

    pub fn as_slice(&self) -> &[Finding] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_keeps_every_finding_in_order() {
        let mut findings = Findings::new();
        findings.push(FindingKind::OrphanAttribute, vec!["A1".into()], "first");
        findings.push(FindingKind::SystemMismatch, vec!["E1".into()], "second");
        findings.push(FindingKind::OrphanAttribute, vec!["A2".into()], "third");

        assert_eq!(findings.len(), 3);
        assert_eq!(findings.count(FindingKind::OrphanAttribute), 2);
        assert_eq!(findings.count(FindingKind::UnassignedEntity), 0);

        let items = findings.into_vec();
        assert_eq!(items[1].message, "second");
        assert_eq!(items[2].ids, vec!["A2".to_string()]);
    }
}
