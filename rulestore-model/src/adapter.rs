//! Storage adapter contract
//!
//! A policy engine keeps its rules in a [`Model`] and persists them through an
//! [`Adapter`]. Bulk operations (`load_policy`, `save_policy`) move the whole
//! rule set; the remaining operations keep storage in step with single
//! changes made to the model ("auto-save").

use std::any::Any;

use crate::model::Model;

/// A filter argument of any shape.
///
/// Adapters down-cast through [`FilterValue::as_any`] to the filter type they
/// understand, and report [`FilterValue::shape`] when the argument is
/// something else.
pub trait FilterValue: Any {
    fn as_any(&self) -> &dyn Any;

    /// Name of the concrete filter type
    fn shape(&self) -> &'static str;
}

impl<T: Any> FilterValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn shape(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Pluggable policy storage.
///
/// The `sec` argument is part of the engine-facing signature; the rule type is
/// fully identified by `ptype`.
pub trait Adapter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append every stored rule to the model
    fn load_policy(&self, model: &mut Model) -> Result<(), Self::Error>;

    /// Append the stored rules matching `filter` to the model and mark the
    /// adapter as filtered
    fn load_filtered_policy(
        &mut self,
        model: &mut Model,
        filter: &dyn FilterValue,
    ) -> Result<(), Self::Error>;

    /// Whether the last load was a filtered one
    fn is_filtered(&self) -> bool;

    /// Replace the stored rule set with the model's rules
    fn save_policy(&self, model: &Model) -> Result<(), Self::Error>;

    fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<(), Self::Error>;

    fn add_policies(
        &self,
        sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), Self::Error>;

    fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<(), Self::Error>;

    fn remove_policies(
        &self,
        sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), Self::Error>;

    /// Remove the rules whose values from `field_index` onwards equal
    /// `field_values`
    fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: isize,
        field_values: &[String],
    ) -> Result<(), Self::Error>;

    fn update_policy(
        &self,
        sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<(), Self::Error>;

    fn update_policies(
        &self,
        sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<(), Self::Error>;

    /// Replace the rules matching the partial filter with `new_rules`,
    /// returning the rules that were replaced
    fn update_filtered_policies(
        &self,
        sec: &str,
        ptype: &str,
        new_rules: &[Vec<String>],
        field_index: isize,
        field_values: &[String],
    ) -> Result<Vec<Vec<String>>, Self::Error>;
}
