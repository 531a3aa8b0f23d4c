//! In-memory policy model

use std::collections::BTreeMap;

/// Rules of a single ptype, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    /// Rule type tag, e.g. `p`, `p2`, `g`
    pub key: String,
    /// Rule tuples without the ptype
    pub policy: Vec<Vec<String>>,
}

impl Assertion {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            policy: Vec::new(),
        }
    }
}

/// Policy rules grouped by section (`p` for permissions, `g` for role
/// grouping) and then by ptype.
///
/// Sections and ptypes iterate in key order; rules within a ptype keep the
/// order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    sections: BTreeMap<String, BTreeMap<String, Assertion>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a ptype under a section, returning its assertion
    pub fn add_def(&mut self, sec: &str, ptype: &str) -> &mut Assertion {
        self.sections
            .entry(sec.to_string())
            .or_default()
            .entry(ptype.to_string())
            .or_insert_with(|| Assertion::new(ptype))
    }

    /// Append a rule. Returns false if the identical rule is already present.
    pub fn add_policy(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> bool {
        let assertion = self.add_def(sec, ptype);
        if assertion.policy.contains(&rule) {
            return false;
        }
        assertion.policy.push(rule);
        true
    }

    /// Remove a rule. Returns false if it was not present.
    pub fn remove_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> bool {
        let Some(assertion) = self
            .sections
            .get_mut(sec)
            .and_then(|section| section.get_mut(ptype))
        else {
            return false;
        };
        match assertion.policy.iter().position(|r| r == rule) {
            Some(idx) => {
                assertion.policy.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn has_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> bool {
        self.get_policy(sec, ptype).iter().any(|r| r == rule)
    }

    /// Rules of one ptype; empty when the ptype is unknown
    pub fn get_policy(&self, sec: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(sec)
            .and_then(|section| section.get(ptype))
            .map(|assertion| assertion.policy.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate the ptypes of a section in key order
    pub fn section<'a>(
        &'a self,
        sec: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Assertion)> + use<'a> {
        self.sections
            .get(sec)
            .into_iter()
            .flat_map(|section| section.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Drop every rule while keeping the declared ptypes
    pub fn clear_policy(&mut self) {
        for section in self.sections.values_mut() {
            for assertion in section.values_mut() {
                assertion.policy.clear();
            }
        }
    }

    /// Total number of rules across all sections
    pub fn policy_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|section| section.values())
            .map(|assertion| assertion.policy.len())
            .sum()
    }
}
