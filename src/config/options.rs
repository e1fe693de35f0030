//! Versioned attribute stores. Every setting carries its default and a
//! `modified` flag; only modified settings are serialized at narrow scopes,
//! and unmodified settings inherit from the next broader scope.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanConfiguration {
    value: bool,
    default: bool,
    modified: bool,
}

impl BooleanConfiguration {
    pub fn new(default: bool) -> Self {
        Self {
            value: default,
            default,
            modified: false,
        }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set_value(&mut self, value: bool) {
        self.value = value;
        self.modified = value != self.default;
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn reset(&mut self) {
        self.value = self.default;
        self.modified = false;
    }

    /// Effective value with scope inheritance: a setting that was never
    /// touched at this scope yields the broader scope's value.
    pub fn effective<'a>(&'a self, broader: &'a Self) -> bool {
        if self.modified {
            self.value
        } else {
            broader.value()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntConfiguration {
    value: i32,
    default: i32,
    modified: bool,
}

impl IntConfiguration {
    pub fn new(default: i32) -> Self {
        Self {
            value: default,
            default,
            modified: false,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
        self.modified = value != self.default;
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn reset(&mut self) {
        self.value = self.default;
        self.modified = false;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringConfiguration {
    value: String,
    default: String,
    modified: bool,
}

impl StringConfiguration {
    pub fn new(default: &str) -> Self {
        Self {
            value: default.to_string(),
            default: default.to_string(),
            modified: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.modified = value != self.default;
        self.value = value.to_string();
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.modified = false;
    }

    pub fn effective<'a>(&'a self, broader: &'a Self) -> &'a str {
        if self.modified {
            &self.value
        } else {
            broader.value()
        }
    }
}

/// Ordered list of strings. The list as a whole is modified once any entry
/// is added; order is preserved because it is significant for link lines and
/// include search order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringListConfiguration {
    value: Vec<String>,
    modified: bool,
}

impl StringListConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &[String] {
        &self.value
    }

    pub fn add(&mut self, entry: &str) {
        self.value.push(entry.to_string());
        self.modified = true;
    }

    pub fn set_value(&mut self, entries: Vec<String>) {
        self.modified = !entries.is_empty() || self.modified;
        self.value = entries;
    }

    pub fn remove_if<F>(&mut self, predicate: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let (removed, kept): (Vec<String>, Vec<String>) =
            self.value.drain(..).partition(|e| predicate(e));
        self.value = kept;
        removed
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A setting ranging over a fixed set of named alternatives. The wire format
/// stores the ordinal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConfiguration {
    value: usize,
    default: usize,
    // The name table is a fixed vocabulary owned by the code; constructors
    // restore it after deserialization, only the ordinals travel.
    #[serde(skip)]
    names: Vec<&'static str>,
    modified: bool,
}

impl EnumConfiguration {
    pub fn new(names: &[&'static str], default: usize) -> Self {
        debug_assert!(default < names.len());
        Self {
            value: default,
            default,
            names: names.to_vec(),
            modified: false,
        }
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn name(&self) -> &'static str {
        self.names[self.value]
    }

    pub fn set_value(&mut self, value: usize) {
        if value < self.names.len() {
            self.value = value;
            self.modified = value != self.default;
        } else {
            log::error!(
                "Enum ordinal {} out of range for {:?}, keeping {}",
                value,
                self.names,
                self.value
            );
        }
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn reset(&mut self) {
        self.value = self.default;
        self.modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn setting_the_default_value_keeps_the_setting_unmodified() {
        let mut b = BooleanConfiguration::new(true);
        b.set_value(true);
        assert!(!b.modified());
        b.set_value(false);
        assert!(b.modified());
        b.set_value(true);
        assert!(!b.modified());
    }

    #[test]
    fn unmodified_setting_inherits_from_broader_scope() {
        let mut project = StringConfiguration::new("");
        project.set_value("-O2");
        let item = StringConfiguration::new("");
        assert_eq!(item.effective(&project), "-O2");

        let mut item_override = StringConfiguration::new("");
        item_override.set_value("-O0");
        assert_eq!(item_override.effective(&project), "-O0");
    }

    #[test]
    fn enum_out_of_range_ordinal_is_ignored() {
        let mut e = EnumConfiguration::new(&["Fast", "Debug", "Release"], 1);
        e.set_value(17);
        assert_eq!(e.value(), 1);
        assert!(!e.modified());
    }

    #[test]
    fn enum_ordinals_round_trip_through_json_without_the_name_table() {
        let mut e = EnumConfiguration::new(&["Fast", "Debug", "Release"], 1);
        e.set_value(2);
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("names"));
        let restored: EnumConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value(), 2);
        assert!(restored.modified());
    }

    #[test]
    fn string_list_preserves_insertion_order() {
        let mut l = StringListConfiguration::new();
        l.add("z");
        l.add("a");
        l.add("m");
        assert_eq!(l.value(), &["z", "a", "m"]);
        assert!(l.modified());
    }
}
