//! Template fingerprinting.
//!
//! Exports and reports record a fingerprint of each template's comparable
//! properties, so a report can be tied to the exact content that was
//! compared even after the catalog publishes a new revision.

use sha2::{Digest, Sha256};

use crate::model::{PropertyMap, PropertyValue, Template};

/// Hasher for template content.
#[derive(Debug, Default)]
pub struct TemplateHasher;

impl TemplateHasher {
    /// Creates a new template hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hashes a template's comparable properties.
    #[must_use]
    pub fn hash_template(&self, template: &Template) -> String {
        let mut hasher = Sha256::new();

        hasher.update(template.kind.as_str().as_bytes());
        hasher.update(self.hash_properties(&template.property_view(), template.kind.comparable_keys()));

        hex::encode(hasher.finalize())
    }

    /// Hashes the given keys of a property map.
    ///
    /// Lists are sorted and deduplicated first, so two maps that compare
    /// equal hash equal.
    #[must_use]
    pub fn hash_properties(&self, properties: &PropertyMap, keys: &[&str]) -> String {
        let mut hasher = Sha256::new();

        for key in keys {
            let Some(value) = properties.get(*key) else {
                continue;
            };

            hasher.update(key.as_bytes());
            hasher.update([0u8]);

            match value {
                PropertyValue::Null => hasher.update([0u8]),
                PropertyValue::Bool(b) => hasher.update([1u8, u8::from(*b)]),
                PropertyValue::Integer(i) => {
                    hasher.update([2u8]);
                    hasher.update(i.to_be_bytes());
                }
                PropertyValue::Number(n) => {
                    hasher.update([5u8]);
                    hasher.update(n.to_string().as_bytes());
                }
                PropertyValue::Text(s) => {
                    hasher.update([3u8]);
                    hasher.update(s.as_bytes());
                }
                PropertyValue::Structured(value) => {
                    hasher.update([6u8]);
                    hasher.update(value.to_string().as_bytes());
                }
                PropertyValue::List(items) => {
                    let mut sorted: Vec<&String> = items.iter().collect();
                    sorted.sort_unstable();
                    sorted.dedup();

                    hasher.update([4u8]);
                    for item in sorted {
                        hasher.update(item.as_bytes());
                        hasher.update([0u8]);
                    }
                }
            }
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}
