//! Supabase / PostgREST backend over HTTP.
//!
//! Tables live under `<url>/rest/v1/<table>`. Filters are rendered as
//! PostgREST operators (`eq.`, `ilike.`, `gte.`, `lte.`, `or=(..)`) and writes
//! ask for `Prefer: return=representation` so the stored rows come back.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use shared_models::Record;
use tracing::{debug, info};

use super::{
    escape_like, validate_identifier, validate_query, validate_row, Condition, Criteria,
    Direction, Query, RemoteStore,
};
use crate::utils::errors::StoreError;

const REST_PATH: &str = "rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";
/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Error body PostgREST sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl PostgrestStore {
    pub fn new(config: &PostgrestConfig) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &PostgrestConfig) -> Self {
        info!(url = %config.url, "PostgREST store configured");
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, StoreError> {
        let table = validate_identifier(table)?;
        let url = format!("{}/{}/{}", self.base_url, REST_PATH, table);
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        validate_query(query)?;
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query_params(&query.criteria, true));
        debug!(table = %query.table, ?params, "select");
        let response = self
            .request(Method::GET, &query.table)?
            .query(&params)
            .send()
            .await?;
        read_rows(response).await
    }

    async fn insert(&self, table: &str, row: Record) -> Result<Vec<Record>, StoreError> {
        validate_row(table, &row)?;
        debug!(table, "insert");
        let response = self
            .request(Method::POST, table)?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row])
            .send()
            .await?;
        read_rows(response).await
    }

    async fn update(&self, query: &Query, changes: Record) -> Result<Vec<Record>, StoreError> {
        validate_query(query)?;
        validate_row(&query.table, &changes)?;
        let params = query_params(&query.criteria, false);
        debug!(table = %query.table, ?params, "update");
        let response = self
            .request(Method::PATCH, &query.table)?
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&params)
            .json(&changes)
            .send()
            .await?;
        read_rows(response).await
    }

    async fn delete(&self, query: &Query) -> Result<u64, StoreError> {
        validate_query(query)?;
        let params = query_params(&query.criteria, false);
        debug!(table = %query.table, ?params, "delete");
        let response = self
            .request(Method::DELETE, &query.table)?
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&params)
            .send()
            .await?;
        Ok(read_rows(response).await?.len() as u64)
    }

    fn backend(&self) -> &'static str {
        "postgrest"
    }
}

async fn read_rows(response: Response) -> Result<Vec<Record>, StoreError> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        return Ok(serde_json::from_str(&body)?);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
    let message = match &parsed {
        Some(err) => describe(err),
        None if body.is_empty() => status.to_string(),
        None => body,
    };
    if parsed.as_ref().and_then(|err| err.code.as_deref()) == Some(UNIQUE_VIOLATION) {
        return Err(StoreError::Conflict(message));
    }
    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

fn describe(err: &ErrorBody) -> String {
    let mut message = err.message.clone().unwrap_or_else(|| "unknown error".to_string());
    if let Some(code) = &err.code {
        message.push_str(&format!(" (code {code})"));
    }
    if let Some(details) = &err.details {
        message.push_str(&format!("; {details}"));
    }
    if let Some(hint) = &err.hint {
        message.push_str(&format!("; hint: {hint}"));
    }
    message
}

/// Renders criteria as PostgREST query parameters. Writes pass
/// `with_window = false` since ordering and paging only apply to reads.
fn query_params(criteria: &Criteria, with_window: bool) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = criteria
        .conditions
        .iter()
        .map(|condition| match condition {
            Condition::Or(_) => ("or".to_string(), filter_value(condition)),
            Condition::Eq(column, _)
            | Condition::ILike(column, _)
            | Condition::Gte(column, _)
            | Condition::Lte(column, _) => (column.clone(), filter_value(condition)),
        })
        .collect();

    if with_window {
        if let Some(order) = &criteria.order {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push((
                "order".to_string(),
                format!("{}.{}.nullslast", order.column, direction),
            ));
        }
        if criteria.offset > 0 {
            params.push(("offset".to_string(), criteria.offset.to_string()));
        }
        if let Some(limit) = criteria.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
    }
    params
}

fn op_name(condition: &Condition) -> &'static str {
    match condition {
        Condition::Eq(..) => "eq",
        Condition::ILike(..) => "ilike",
        Condition::Gte(..) => "gte",
        Condition::Lte(..) => "lte",
        Condition::Or(..) => "or",
    }
}

fn operand(condition: &Condition) -> String {
    match condition {
        Condition::Eq(_, value) | Condition::Gte(_, value) | Condition::Lte(_, value) => {
            scalar_text(value)
        }
        Condition::ILike(_, pattern) => format!("*{}*", escape_like(pattern)),
        Condition::Or(_) => String::new(),
    }
}

/// Value of a top-level `column=op.operand` parameter.
fn filter_value(condition: &Condition) -> String {
    match condition {
        Condition::Eq(_, Value::Null) => "is.null".to_string(),
        Condition::Or(conditions) => format!("({})", or_list(conditions)),
        _ => format!("{}.{}", op_name(condition), operand(condition)),
    }
}

/// Members of an `or=(..)` group. Operands are double-quoted so commas and
/// parentheses inside values do not break the list.
fn or_list(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(|condition| match condition {
            Condition::Eq(column, Value::Null) => format!("{column}.is.null"),
            Condition::Or(nested) => format!("or({})", or_list(nested)),
            Condition::Eq(column, _)
            | Condition::ILike(column, _)
            | Condition::Gte(column, _)
            | Condition::Lte(column, _) => format!(
                "{column}.{}.{}",
                op_name(condition),
                quote(&operand(condition))
            ),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quote(operand: &str) -> String {
    format!(
        "\"{}\"",
        operand.replace('\\', "\\\\").replace('"', "\\\"")
    )
}
