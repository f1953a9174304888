//! Tests for the process-wide driver and date policy.
//!
//! These share global state, so they live in one test in their own binary.

mod common;

use anyhow::{Context, Result};
use pretty_assertions::assert_eq;
use stubql_driver::{
    DRIVER_NAME, DatePolicy, DriverRegistry, StubqlError, Value, date_policy, rows_from_csv,
    set_date_policy,
};

#[tokio::test]
async fn test_global_driver_lifecycle() -> Result<()> {
    common::initialize_logging();

    // registration happens once, however often it is requested
    assert!(stubql_driver::register());
    assert!(!stubql_driver::register());
    assert!(DriverRegistry::global().has(DRIVER_NAME));

    stubql_driver::default_connection()
        .stub_query("select count(*) from foo", rows_from_csv(["count"], "5")?);
    let db = stubql_driver::open("").await?;
    let count = db
        .query_row("SELECT COUNT(*) FROM foo", &[])
        .await?
        .context("count should be stubbed")?;
    assert_eq!(count.get(0).and_then(Value::as_i64), Some(5));

    // the driver shares state with connections fetched by DSN
    stubql_driver::connection("reports").stub_query_error(
        "select * from totals",
        StubqlError::other("reports offline"),
    );
    let reports = stubql_driver::open("reports").await?;
    let err = reports.query("select * from totals", &[]).await.err().unwrap();
    assert_eq!(err.to_string(), "reports offline");

    stubql_driver::reset();
    let db = stubql_driver::open("").await?;
    assert!(
        db.query("select count(*) from foo", &[])
            .await
            .err()
            .unwrap()
            .is_not_stubbed()
    );

    // process-wide date policy applies to fixtures that don't pin one
    assert_eq!(date_policy(), DatePolicy::Pattern);
    let pattern = rows_from_csv(["created"], "2012-10-01 01:00:01")?;
    assert!(matches!(pattern.rows()[0][0], Value::DateTime(_)));

    set_date_policy(DatePolicy::Rfc3339);
    let rfc = rows_from_csv(["created"], "2012-10-01 01:00:01\n2012-10-01T01:00:01Z")?;
    assert_eq!(rfc.rows()[0][0], Value::from("2012-10-01 01:00:01"));
    assert!(matches!(rfc.rows()[1][0], Value::DateTimeUtc(_)));

    set_date_policy(DatePolicy::Pattern);
    Ok(())
}
