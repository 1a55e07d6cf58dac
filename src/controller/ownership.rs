//! # Ownership Arbiter
//!
//! Shared secrets carry a single controller label naming the party that
//! manages their physical mirror. This module reads that label and decides,
//! from the current ownership and usage, what a reconciliation pass may do.
//!
//! | ownership        | used  | decision     |
//! |------------------|-------|--------------|
//! | `Unclaimed`      | true  | `Claim`      |
//! | `OwnedByOther`   | true  | `Defer`      |
//! | `OwnedBySelf`    | true  | `Proceed`    |
//! | `OwnedBySelf`    | false | `Relinquish` |
//! | anything else    | false | `Idle`       |
//!
//! The label is not a lock. Correctness relies on passes for one secret
//! being serialized by the controller runtime.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    Unclaimed,
    OwnedBySelf,
    OwnedByOther(String),
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Unclaimed => f.write_str("unclaimed"),
            Ownership::OwnedBySelf => f.write_str("owned"),
            Ownership::OwnedByOther(other) => write!(f, "owned-by:{other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Write the label; nothing else this pass
    Claim,
    /// Another controller holds the label; touch nothing
    Defer,
    /// Owned and needed; mirror the object
    Proceed,
    /// Owned but no longer needed; remove the label
    Relinquish,
    /// Neither owned nor needed
    Idle,
}

impl Decision {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Claim => "claim",
            Decision::Defer => "defer",
            Decision::Proceed => "proceed",
            Decision::Relinquish => "relinquish",
            Decision::Idle => "idle",
        }
    }
}

#[must_use]
pub fn decide(ownership: &Ownership, used: bool) -> Decision {
    match (ownership, used) {
        (Ownership::Unclaimed, true) => Decision::Claim,
        (Ownership::OwnedByOther(_), true) => Decision::Defer,
        (Ownership::OwnedBySelf, true) => Decision::Proceed,
        (Ownership::OwnedBySelf, false) => Decision::Relinquish,
        (Ownership::Unclaimed | Ownership::OwnedByOther(_), false) => Decision::Idle,
    }
}

/// Label key and value identifying this controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipArbiter {
    label_key: String,
    controller_name: String,
}

impl OwnershipArbiter {
    pub fn new(label_key: impl Into<String>, controller_name: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
            controller_name: controller_name.into(),
        }
    }

    #[must_use]
    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    #[must_use]
    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    /// An absent or empty label value counts as unclaimed.
    #[must_use]
    pub fn ownership_of(&self, labels: Option<&BTreeMap<String, String>>) -> Ownership {
        match labels.and_then(|l| l.get(&self.label_key)).map(String::as_str) {
            None | Some("") => Ownership::Unclaimed,
            Some(owner) if owner == self.controller_name => Ownership::OwnedBySelf,
            Some(owner) => Ownership::OwnedByOther(owner.to_string()),
        }
    }

    /// Set the label to this controller.
    pub fn claim(&self, labels: &mut Option<BTreeMap<String, String>>) {
        labels
            .get_or_insert_with(BTreeMap::new)
            .insert(self.label_key.clone(), self.controller_name.clone());
    }

    /// Remove the label only if this controller holds it. Returns whether
    /// anything changed.
    pub fn relinquish(&self, labels: &mut Option<BTreeMap<String, String>>) -> bool {
        match labels.as_mut() {
            Some(map) if map.get(&self.label_key) == Some(&self.controller_name) => {
                map.remove(&self.label_key);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> OwnershipArbiter {
        OwnershipArbiter::new("example.com/controlled-by", "me")
    }

    fn labels(value: &str) -> Option<BTreeMap<String, String>> {
        Some(BTreeMap::from([(
            "example.com/controlled-by".to_string(),
            value.to_string(),
        )]))
    }

    #[test]
    fn test_ownership_of() {
        let arbiter = arbiter();
        assert_eq!(arbiter.ownership_of(None), Ownership::Unclaimed);
        assert_eq!(arbiter.ownership_of(labels("").as_ref()), Ownership::Unclaimed);
        assert_eq!(arbiter.ownership_of(labels("me").as_ref()), Ownership::OwnedBySelf);
        assert_eq!(
            arbiter.ownership_of(labels("them").as_ref()),
            Ownership::OwnedByOther("them".to_string())
        );
    }

    #[test]
    fn test_decision_table() {
        let other = Ownership::OwnedByOther("them".to_string());
        assert_eq!(decide(&Ownership::Unclaimed, true), Decision::Claim);
        assert_eq!(decide(&other, true), Decision::Defer);
        assert_eq!(decide(&Ownership::OwnedBySelf, true), Decision::Proceed);
        assert_eq!(decide(&Ownership::OwnedBySelf, false), Decision::Relinquish);
        assert_eq!(decide(&Ownership::Unclaimed, false), Decision::Idle);
        assert_eq!(decide(&other, false), Decision::Idle);
    }

    #[test]
    fn test_relinquish_leaves_foreign_label() {
        let arbiter = arbiter();
        let mut foreign = labels("them");
        assert!(!arbiter.relinquish(&mut foreign));
        assert_eq!(foreign, labels("them"));

        let mut mine = labels("me");
        assert!(arbiter.relinquish(&mut mine));
        assert_eq!(arbiter.ownership_of(mine.as_ref()), Ownership::Unclaimed);
    }

    #[test]
    fn test_claim_creates_label_map() {
        let arbiter = arbiter();
        let mut none = None;
        arbiter.claim(&mut none);
        assert_eq!(arbiter.ownership_of(none.as_ref()), Ownership::OwnedBySelf);
    }
}
