use business_registry::{
    models::{json_kind, Record},
    BaseRepository, RepositoryError, SearchFilters,
};
use serde_json::Value;
use thiserror::Error;

use crate::{api::RegistryApi, config::Config};

/// Error type for registry commands
#[derive(Debug, Error)]
pub enum Error {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Commands over schema-less table rows
pub struct RegistryCommands {
    api: RegistryApi,
    config: Config,
}

impl RegistryCommands {
    pub fn new(api: RegistryApi, config: Config) -> Self {
        Self { api, config }
    }

    /// Print every row of a table
    pub async fn list(&self, table: &str) -> Result<(), Error> {
        let rows = self.api.table(table).get_all().await?;
        self.print_rows(&rows)?;
        eprintln!("{} row(s) from {}", rows.len(), table);
        Ok(())
    }

    /// Print one row by id
    pub async fn get(&self, table: &str, id: &str) -> Result<(), Error> {
        let row = self.api.table(table).get_by_id(id).await?;
        self.print(&Value::Object(row))
    }

    /// OR search over `field=value` pairs, optionally paged
    pub async fn search(
        &self,
        table: &str,
        fields: &[(String, Value)],
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<(), Error> {
        let mut filters = fields
            .iter()
            .fold(SearchFilters::new(), |filters, (name, value)| {
                filters.field(name.as_str(), value.clone())
            });
        if let Some(page) = page {
            filters = filters.paginate(page, limit.unwrap_or(self.config.page_size));
        } else if let Some(limit) = limit {
            filters = filters.paginate(1, limit);
        }

        let rows = self.api.table(table).get_by_filters(&filters).await?;
        self.print_rows(&rows)
    }

    /// Insert a row given as a JSON object
    pub async fn create(&self, table: &str, json: &str) -> Result<(), Error> {
        let row = parse_record(json)?;
        let saved = self.api.table(table).post(&row).await?;
        self.print(&Value::Object(saved))
    }

    /// Apply a JSON object of changes to one row
    pub async fn patch(&self, table: &str, id: &str, json: &str) -> Result<(), Error> {
        let changes = parse_record(json)?;
        let updated = self.api.table(table).patch(&changes, id).await?;
        self.print(&Value::Object(updated))
    }

    /// Delete one row by id
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        self.api.table(table).delete(id).await?;
        println!("Deleted {} from {}", id, table);
        Ok(())
    }

    fn print_rows(&self, rows: &[Record]) -> Result<(), Error> {
        let rows = rows.iter().cloned().map(Value::Object).collect();
        self.print(&Value::Array(rows))
    }

    fn print(&self, value: &Value) -> Result<(), Error> {
        let text = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| Error::Parse(e.to_string()))?;
        println!("{}", text);
        Ok(())
    }
}

/// Splits `name=value`. The value is read as JSON when it parses, so
/// `age=40` filters on a number; anything else is taken as text.
pub fn parse_field(raw: &str) -> Result<(String, Value), Error> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::Parse(format!("expected name=value, got '{}'", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Parse(format!("missing field name in '{}'", raw)));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

pub fn parse_record(json: &str) -> Result<Record, Error> {
    match serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))? {
        Value::Object(record) => Ok(record),
        other => Err(Error::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_values_prefer_json() {
        assert_eq!(parse_field("age=40").unwrap(), ("age".to_string(), json!(40)));
        assert_eq!(parse_field("active=true").unwrap(), ("active".to_string(), json!(true)));
        assert_eq!(parse_field("name=jo").unwrap(), ("name".to_string(), json!("jo")));
        assert_eq!(
            parse_field("note=a=b").unwrap(),
            ("note".to_string(), json!("a=b"))
        );
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert!(matches!(parse_field("name"), Err(Error::Parse(_))));
        assert!(matches!(parse_field("=jo"), Err(Error::Parse(_))));
    }

    #[test]
    fn records_must_be_objects() {
        assert!(parse_record(r#"{"name": "Jane"}"#).is_ok());
        assert!(matches!(parse_record("[1, 2]"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("{"), Err(Error::Parse(_))));
    }
}
