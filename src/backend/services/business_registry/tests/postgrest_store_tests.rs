use anyhow::Result;
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;

use business_registry::{
    models::{customer::Customer, Record},
    repositories::{BaseRepository, SearchFilters, TableRepository},
    store::{Criteria, PostgrestConfig, PostgrestStore, Query, RemoteStore},
    utils::errors::{RepositoryError, StoreError},
};

const API_KEY: &str = "service-role-key";

fn store_for(server: &mockito::ServerGuard) -> Result<PostgrestStore> {
    Ok(PostgrestStore::new(&PostgrestConfig {
        url: server.url(),
        api_key: API_KEY.to_string(),
    })?)
}

fn customers(store: PostgrestStore) -> TableRepository<Customer> {
    TableRepository::new(Arc::new(store), "customer")
}

#[tokio::test]
async fn test_get_by_id_sends_eq_filter_and_credentials() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/customer")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("id".into(), "eq.c-1".into()),
        ]))
        .match_header("apikey", API_KEY)
        .match_header("authorization", format!("Bearer {API_KEY}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":"c-1","name":"John","email":"john@example.com","status":"ACTIVE"}]"#)
        .create_async()
        .await;

    let repo = customers(store_for(&server)?);
    let found = repo.get_by_id("c-1").await?;
    assert_eq!(found.name, "John");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_empty_result_is_not_found() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/customer")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let repo = customers(store_for(&server)?);
    let err = repo.get_by_id("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_filters_render_or_group_and_range() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/customer")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("or".into(), "(name.ilike.\"*jo*\")".into()),
            Matcher::UrlEncoded("offset".into(), "10".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let repo = customers(store_for(&server)?);
    let found = repo
        .get_by_filters(&SearchFilters::new().field("name", "jo").paginate(2, 10))
        .await?;
    assert!(found.is_empty());
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_post_asks_for_representation() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/customer")
        .match_header("prefer", "return=representation")
        .match_body(Matcher::Json(json!([{"name": "Jane", "email": "jane@example.com", "status": "ACTIVE"}])))
        .with_status(201)
        .with_body(r#"[{"id":"generated-id","name":"Jane","email":"jane@example.com","status":"ACTIVE"}]"#)
        .create_async()
        .await;

    let repo = customers(store_for(&server)?);
    let saved = repo.post(&Customer::new("Jane", "jane@example.com")).await?;
    assert_eq!(saved.id.as_deref(), Some("generated-id"));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_patch_sends_only_supplied_fields() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/rest/v1/notes")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.n-1".into()))
        .match_body(Matcher::Json(json!({"body": "updated"})))
        .with_status(200)
        .with_body(r#"[{"id":"n-1","body":"updated","priority":2}]"#)
        .create_async()
        .await;

    let repo: TableRepository<Record> = TableRepository::new(Arc::new(store_for(&server)?), "notes");
    let Value::Object(changes) = json!({"body": "updated"}) else {
        unreachable!()
    };
    let updated = repo.patch(&changes, "n-1").await?;
    assert_eq!(updated["priority"], json!(2));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_delete_counts_returned_rows() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/rest/v1/notes")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.n-1".into()))
        .with_status(200)
        .with_body("[]")
        .expect(2)
        .create_async()
        .await;

    let store = store_for(&server)?;
    let query = Query::new(
        "notes",
        Criteria::new().eq("id", "n-1"),
    );
    assert_eq!(store.delete(&query).await?, 0);

    let repo: TableRepository<Record> = TableRepository::new(Arc::new(store), "notes");
    repo.delete("n-1").await?;
    Ok(())
}

#[tokio::test]
async fn test_error_body_surfaces_as_remote_error() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/customer")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"message":"column customer.nme does not exist","code":"42703","details":null,"hint":null}"#)
        .create_async()
        .await;

    let store = store_for(&server)?;
    let err = store
        .select(&Query::table("customer"))
        .await
        .unwrap_err();
    match err {
        StoreError::Remote { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("does not exist"));
            assert!(message.contains("42703"));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_unique_violation_is_conflict() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/customer")
        .with_status(409)
        .with_body(r#"{"message":"duplicate key value violates unique constraint","code":"23505"}"#)
        .create_async()
        .await;

    let repo = customers(store_for(&server)?);
    let err = repo
        .post(&Customer::new("Jane", "jane@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Store(StoreError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn test_post_without_echoed_row_is_empty_response() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/notes")
        .with_status(201)
        .with_body("[]")
        .create_async()
        .await;

    let repo: TableRepository<Record> = TableRepository::new(Arc::new(store_for(&server)?), "notes");
    let Value::Object(row) = json!({"body": "hidden by row security"}) else {
        unreachable!()
    };
    let err = repo.post(&row).await.unwrap_err();
    match err {
        RepositoryError::Store(StoreError::EmptyResponse { table, operation }) => {
            assert_eq!(table, "notes");
            assert_eq!(operation, "insert");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_patch_remote_failure_is_store_error() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("PATCH", "/rest/v1/notes")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"canceling statement due to statement timeout","code":"57014"}"#)
        .create_async()
        .await;

    let repo: TableRepository<Record> = TableRepository::new(Arc::new(store_for(&server)?), "notes");
    let Value::Object(changes) = json!({"body": "updated"}) else {
        unreachable!()
    };
    let err = repo.patch(&changes, "n-1").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(
        err,
        RepositoryError::Store(StoreError::Remote { status: 500, .. })
    ));
    Ok(())
}
