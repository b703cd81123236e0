//! Table-scoped query description shared by every store backend.
//!
//! Conditions at the top level of [`Criteria`] are AND-ed; [`Condition::Or`]
//! groups are the only disjunction.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact equality. A `null` value matches missing or null columns.
    Eq(String, Value),
    /// Case-insensitive substring match against the column's text form.
    ILike(String, String),
    Gte(String, Value),
    Lte(String, Value),
    Or(Vec<Condition>),
}

impl Condition {
    /// Every column this condition reads, including those nested in `Or` groups.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Condition::Eq(column, _)
            | Condition::ILike(column, _)
            | Condition::Gte(column, _)
            | Condition::Lte(column, _) => vec![column.as_str()],
            Condition::Or(conditions) => conditions.iter().flat_map(Condition::columns).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort order. Nulls always sort last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub conditions: Vec<Condition>,
    pub order: Option<Order>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::ILike(column.into(), pattern.into()));
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte(column.into(), value.into()));
        self
    }

    pub fn lte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte(column.into(), value.into()));
        self
    }

    /// Adds a disjunction. An empty list adds nothing.
    pub fn or(mut self, conditions: Vec<Condition>) -> Self {
        if !conditions.is_empty() {
            self.conditions.push(Condition::Or(conditions));
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// Restricts results to the inclusive row window `from..=to`.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.offset = from;
        self.limit = Some(to.saturating_add(1).saturating_sub(from));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same conditions with ordering and windowing dropped, as used by writes.
    pub fn filter_only(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ..Self::default()
        }
    }

    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.conditions.iter().flat_map(Condition::columns).collect();
        if let Some(order) = &self.order {
            columns.push(order.column.as_str());
        }
        columns
    }
}

/// A [`Criteria`] bound to one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub criteria: Criteria,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self::new(table, Criteria::new())
    }

    pub fn new(table: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            table: table.into(),
            criteria,
        }
    }
}
