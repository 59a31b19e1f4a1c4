use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public name of the request-scoped targeting bag.
pub const TARGETING_BAG_SESSION: &str = "pimcore_targeting_session";

/// Public name of the cross-visit targeting bag.
pub const TARGETING_BAG_VISITOR: &str = "pimcore_targeting_visitor";

/// Public-name/storage-key pair identifying a session bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBagDescriptor {
    name: &'static str,
}

impl SessionBagDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Storage key: the public name prefixed with an underscore.
    pub fn storage_key(&self) -> String {
        format!("_{}", self.name)
    }
}

/// The two bags the guard attaches, in registration order.
pub fn targeting_bags() -> [SessionBagDescriptor; 2] {
    [
        SessionBagDescriptor::new(TARGETING_BAG_SESSION),
        SessionBagDescriptor::new(TARGETING_BAG_VISITOR),
    ]
}

/// A named, independently-serialized key/value partition of a session.
///
/// Keeping targeting data in its own partitions lets the full-page cache
/// exclude it by storage key without touching general session handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBag {
    name: String,
    storage_key: String,
    attributes: HashMap<String, Value>,
}

impl AttributeBag {
    pub fn new(descriptor: SessionBagDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            storage_key: descriptor.storage_key(),
            attributes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_is_underscore_prefixed_name() {
        let bag = SessionBagDescriptor::new(TARGETING_BAG_SESSION);
        assert_eq!(bag.name(), "pimcore_targeting_session");
        assert_eq!(bag.storage_key(), "_pimcore_targeting_session");
    }

    #[test]
    fn targeting_bags_are_session_then_visitor() {
        let [session, visitor] = targeting_bags();
        assert_eq!(session.name(), TARGETING_BAG_SESSION);
        assert_eq!(visitor.name(), TARGETING_BAG_VISITOR);
    }

    #[test]
    fn attribute_round_trip() {
        let mut bag = AttributeBag::new(SessionBagDescriptor::new(TARGETING_BAG_VISITOR));
        assert!(bag.is_empty());

        bag.set("segment", "returning");
        assert!(bag.has("segment"));
        assert_eq!(bag.get("segment").and_then(Value::as_str), Some("returning"));

        assert_eq!(bag.remove("segment").and_then(|v| v.as_str().map(String::from)), Some("returning".to_string()));
        assert!(bag.is_empty());
    }

    #[test]
    fn clear_empties_the_bag_only() {
        let mut bag = AttributeBag::new(SessionBagDescriptor::new(TARGETING_BAG_SESSION));
        bag.set("a", 1);
        bag.set("b", 2);
        bag.clear();

        assert!(bag.is_empty());
        assert_eq!(bag.storage_key(), "_pimcore_targeting_session");
    }
}
