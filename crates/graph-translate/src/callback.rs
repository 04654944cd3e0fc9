//! Deferred callback values.
//!
//! Attributes marked as populated by a callback are written from a
//! placeholder parameter, `$resolvedCallbacks.<key>`. The caller runs the
//! callbacks after translation and binds their results under those keys.

use crate::schema::WriteOperation;
use serde::{Deserialize, Serialize};

/// A callback the caller must resolve before executing the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCallback {
    /// Key under the callback parameter map
    pub key: String,
    /// Callback name as declared on the attribute
    pub callback: String,
    /// Attribute the value is written to
    pub attribute: String,
    pub operation: WriteOperation,
}

/// Collects callback placeholders during one translation.
#[derive(Debug, Default)]
pub struct CallbackBucket {
    pending: Vec<PendingCallback>,
}

impl CallbackBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and return the key its value is expected under
    pub fn add(&mut self, callback: &str, attribute: &str, operation: WriteOperation) -> String {
        let key = format!("{}{}", callback, self.pending.len());
        self.pending.push(PendingCallback {
            key: key.clone(),
            callback: callback.to_string(),
            attribute: attribute.to_string(),
            operation,
        });
        key
    }

    pub fn pending(&self) -> &[PendingCallback] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn into_pending(self) -> Vec<PendingCallback> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_per_registration() {
        let mut bucket = CallbackBucket::new();
        let a = bucket.add("slugify", "slug", WriteOperation::Update);
        let b = bucket.add("slugify", "slug", WriteOperation::Update);

        assert_eq!(a, "slugify0");
        assert_eq!(b, "slugify1");
        assert_eq!(bucket.pending().len(), 2);
    }
}
