//! Offset pagination.

use crate::cursor::cursor_to_offset;
use crate::error::{Result, TranslateError};
use cypher_builder::Param;
use serde_json::json;

/// Skip and limit requested for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Parameters a projection applies as `SKIP` and `LIMIT`.
#[derive(Debug, Clone, Default)]
pub struct PaginationField {
    pub skip: Option<Param>,
    pub limit: Option<Param>,
}

impl Pagination {
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self { skip, limit }
    }

    /// Relay arguments: `first` elements after the element at cursor `after`
    pub fn from_relay(first: Option<u64>, after: Option<&str>) -> Result<Self> {
        let skip = match after {
            Some(cursor) => {
                let offset = cursor_to_offset(cursor)?;
                let skip = offset.checked_add(1).ok_or_else(|| {
                    TranslateError::InvalidInput(format!("cursor offset {offset} is out of range"))
                })?;
                Some(skip)
            }
            None => None,
        };
        Ok(Self { skip, limit: first })
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.limit.is_none()
    }

    pub fn pagination_field(&self) -> PaginationField {
        PaginationField {
            skip: self.skip.map(|skip| Param::new(json!(skip))),
            limit: self.limit.map(|limit| Param::new(json!(limit))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::offset_to_cursor;

    #[test]
    fn test_relay_after_skips_past_cursor() {
        let cursor = offset_to_cursor(4);
        let pagination = Pagination::from_relay(Some(10), Some(&cursor)).unwrap();
        assert_eq!(pagination, Pagination::new(Some(5), Some(10)));
    }

    #[test]
    fn test_relay_after_last_offset_is_rejected() {
        let cursor = offset_to_cursor(u64::MAX);
        let error = Pagination::from_relay(Some(1), Some(&cursor)).unwrap_err();
        assert!(matches!(error, TranslateError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_pagination_has_no_params() {
        let field = Pagination::default().pagination_field();
        assert!(field.skip.is_none());
        assert!(field.limit.is_none());
        assert!(Pagination::default().is_empty());
    }

    #[test]
    fn test_pagination_params_carry_values() {
        let field = Pagination::new(Some(2), Some(3)).pagination_field();
        assert_eq!(field.skip.unwrap().value(), &json!(2));
        assert_eq!(field.limit.unwrap().value(), &json!(3));
    }
}
