//! Execution engine behavior against a scripted in-memory driver.

mod common;

use std::sync::atomic::Ordering;

use futures_util::StreamExt;

use common::{row, FakeFactory, Script};
use sql_conduit::{
    DatabaseClient, Dialect, DriverError, ErrorKind, Predicate, Select, SqlConduitError, SqlValue,
    Update,
};

fn person_rows(count: i64) -> Vec<sql_conduit::Row> {
    (1..=count)
        .map(|i| {
            row(
                &["id", "name"],
                vec![SqlValue::Int(i), SqlValue::Text(format!("p{i}"))],
            )
        })
        .collect()
}

#[tokio::test]
async fn nothing_touches_the_driver_until_first_poll() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(1))]);
    let client = DatabaseClient::new(factory.clone());

    let stream = client.execute(Select::from_table("person")).fetch();
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 0);
    assert!(factory.recorded_sql().is_empty());

    drop(stream);
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 0);
    assert_eq!(factory.released.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rows_arrive_in_driver_order_and_the_connection_is_released() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(3))]);
    let client = DatabaseClient::new(factory.clone());

    let rows = client
        .execute(Select::from_table("person").order_by("id"))
        .fetch()
        .fetch_all()
        .await
        .unwrap();

    let names: Vec<_> = rows
        .iter()
        .map(|r| r.get("name").and_then(SqlValue::as_text).unwrap())
        .collect();
    assert_eq!(names, ["p1", "p2", "p3"]);
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(factory.released.load(Ordering::SeqCst), 1);
    assert_eq!(
        factory.recorded_sql(),
        ["SELECT * FROM person ORDER BY id"]
    );
}

#[tokio::test]
async fn dropping_a_partially_consumed_stream_releases_the_connection_once() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(5))]);
    let client = DatabaseClient::new(factory.clone());

    let mut stream = client.execute(Select::from_table("person")).fetch();
    let first = stream.next().await.unwrap().unwrap();
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(second.get("id"), Some(&SqlValue::Int(2)));
    assert_eq!(factory.released.load(Ordering::SeqCst), 0);

    drop(stream);
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(factory.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_mid_stream_failure_surfaces_after_the_delivered_rows() {
    let error = DriverError::new("canceling statement due to statement timeout")
        .with_sqlstate("57014");
    let factory = FakeFactory::new(
        "PostgreSQL",
        vec![Script::RowsThenError(person_rows(2), error)],
    );
    let client = DatabaseClient::new(factory.clone());

    let mut stream = client.execute(Select::from_table("person")).fetch();
    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.unwrap().is_ok());

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Transient));
    assert!(stream.next().await.is_none());
    assert_eq!(factory.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rows_updated_returns_the_count_and_renders_for_the_dialect() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Updated(2)]);
    let client = DatabaseClient::new(factory.clone());

    let count = client
        .execute(
            Update::table("person")
                .set("age", 35_i64)
                .filter(Predicate::eq("id", "joe")),
        )
        .rows_updated()
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        factory.recorded_sql(),
        ["UPDATE person SET age = $1 WHERE id = $2"]
    );
    let recorded = factory.recorded.lock().unwrap();
    assert_eq!(
        recorded[0].binds,
        vec![
            (0, SqlValue::Int(35)),
            (1, SqlValue::Text("joe".into())),
        ]
    );
}

#[tokio::test]
async fn a_result_of_the_wrong_shape_is_a_usage_error() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Updated(1)]);
    let client = DatabaseClient::new(factory.clone());
    let err = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Usage(_)));
    // The connection from the failed attempt is still released.
    assert_eq!(factory.released.load(Ordering::SeqCst), 1);

    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(1))]);
    let client = DatabaseClient::new(factory);
    let err = client
        .execute(Update::table("person").set("age", 1_i64))
        .rows_updated()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Usage(_)));
}

#[tokio::test]
async fn an_unknown_product_fails_with_an_unresolved_dialect() {
    let factory = FakeFactory::new("FoobarDB", vec![Script::Rows(person_rows(1))]);
    let client = DatabaseClient::new(factory.clone());

    let err = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_all()
        .await
        .unwrap_err();
    match err {
        SqlConduitError::UnresolvedDialect { product } => assert_eq!(product, "FoobarDB"),
        other => panic!("expected unresolved dialect, got {other:?}"),
    }
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 0);

    // An explicit dialect bypasses resolution entirely.
    let client = DatabaseClient::with_dialect(factory.clone(), Dialect::postgres());
    let rows = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn the_dialect_is_resolved_once_per_client() {
    let factory = FakeFactory::new(
        "PostgreSQL",
        vec![Script::Updated(1), Script::Updated(1)],
    );
    let client = DatabaseClient::new(factory.clone());

    for _ in 0..2 {
        client
            .execute(Update::table("t").set("a", 1_i64))
            .rows_updated()
            .await
            .unwrap();
    }
    assert_eq!(factory.metadata_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn raw_sql_binds_flow_through_in_marker_order() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(1))]);
    let client = DatabaseClient::new(factory.clone());

    let row = client
        .sql("SELECT * FROM person WHERE id = :id AND age > ?")
        .bind(30_i64)
        .bind_named("id", 7_i64)
        .fetch()
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(row.get("name"), Some(&SqlValue::Text("p1".into())));

    assert_eq!(
        factory.recorded_sql(),
        ["SELECT * FROM person WHERE id = $1 AND age > $2"]
    );
    let recorded = factory.recorded.lock().unwrap();
    assert_eq!(
        recorded[0].binds,
        vec![(0, SqlValue::Int(7)), (1, SqlValue::Int(30))]
    );
}

#[tokio::test]
async fn binds_on_a_structured_statement_fail_before_the_driver() {
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(person_rows(1))]);
    let client = DatabaseClient::new(factory.clone());

    let err = client
        .execute(Select::from_table("person"))
        .bind(1_i64)
        .fetch()
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Usage(_)));
    assert_eq!(factory.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_optional_and_fetch_one_on_empty_results() {
    let factory = FakeFactory::new(
        "PostgreSQL",
        vec![Script::Rows(Vec::new()), Script::Rows(Vec::new())],
    );
    let client = DatabaseClient::new(factory);

    let none = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_optional()
        .await
        .unwrap();
    assert!(none.is_none());

    let err = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_one()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Usage(_)));
}

#[tokio::test]
async fn driver_failures_are_translated_with_the_cause_retained() {
    let error = DriverError::new("duplicate key value violates unique constraint")
        .with_sqlstate("23505");
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Fail(error)]);
    let client = DatabaseClient::new(factory.clone());

    let err = client
        .execute(Select::from_table("person"))
        .fetch()
        .fetch_all()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ConstraintViolation));
    assert_eq!(
        err.driver_error().and_then(|e| e.sqlstate.as_deref()),
        Some("23505")
    );
    assert_eq!(factory.released.load(Ordering::SeqCst), 1);
}
