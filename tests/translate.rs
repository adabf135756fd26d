//! Driver-error translation across the built-in dialect catalog.

use std::error::Error as _;

use sql_conduit::{translate, Dialect, DriverError, ErrorKind, SqlConduitError};

#[test]
fn mysql_vendor_codes_classify_without_a_sqlstate() {
    let dialect = Dialect::mysql();
    let cases = [
        (1062, ErrorKind::ConstraintViolation),
        (1213, ErrorKind::Transient),
        (2006, ErrorKind::Connectivity),
        (1146, ErrorKind::Syntax),
    ];
    for (code, expected) in cases {
        let err = translate(&dialect, DriverError::new("boom").with_code(code));
        assert_eq!(err.kind(), Some(expected), "code {code}");
    }
}

#[test]
fn mssql_mixes_sqlstates_and_vendor_codes() {
    let dialect = Dialect::mssql();
    let err = translate(
        &dialect,
        DriverError::new("constraint conflict").with_sqlstate("23000"),
    );
    assert_eq!(err.kind(), Some(ErrorKind::ConstraintViolation));

    let err = translate(&dialect, DriverError::new("deadlock victim").with_code(1205));
    assert_eq!(err.kind(), Some(ErrorKind::Transient));

    let err = translate(&dialect, DriverError::new("invalid object name").with_code(208));
    assert_eq!(err.kind(), Some(ErrorKind::Syntax));
}

#[test]
fn every_driver_failure_becomes_exactly_one_portable_kind() {
    let dialect = Dialect::postgres();
    let err = translate(&dialect, DriverError::new("something odd").with_code(-999));
    assert_eq!(err.kind(), Some(ErrorKind::General));

    let err = translate(&dialect, DriverError::new("no diagnostics"));
    assert_eq!(err.kind(), Some(ErrorKind::General));
}

#[test]
fn the_original_error_is_reachable_through_the_source_chain() {
    let dialect = Dialect::postgres();
    let err = translate(
        &dialect,
        DriverError::new("duplicate key value violates unique constraint \"person_pkey\"")
            .with_sqlstate("23505"),
    );
    assert!(matches!(err, SqlConduitError::DataAccess { .. }));
    let source = err.source().expect("source retained");
    assert!(source.to_string().contains("person_pkey"));
}
