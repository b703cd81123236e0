use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Record;
use crate::store::{Condition, Criteria};

/// Free-form search over a table.
///
/// Every entry in `fields` becomes one alternative of an OR group: string
/// values match as case-insensitive substrings, anything else by equality.
/// `page` (1-based) and `limit` only take effect when both are non-zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub fields: Record,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Inclusive `(from, to)` row window, `from = (page - 1) * limit`.
    pub fn window(&self) -> Option<(u64, u64)> {
        match (self.page, self.limit) {
            (Some(page), Some(limit)) if page > 0 && limit > 0 => {
                let from = u64::from(page - 1) * u64::from(limit);
                Some((from, from + u64::from(limit) - 1))
            }
            _ => None,
        }
    }

    pub fn to_criteria(&self) -> Criteria {
        let alternatives = self
            .fields
            .iter()
            .map(|(name, value)| match value {
                Value::String(text) => Condition::ILike(name.clone(), text.clone()),
                other => Condition::Eq(name.clone(), other.clone()),
            })
            .collect();
        let criteria = Criteria::new().or(alternatives);
        match self.window() {
            Some((from, to)) => criteria.range(from, to),
            None => criteria,
        }
    }
}
