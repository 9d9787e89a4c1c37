//! Executor behavior against the scripted driver: status codes, flag handling,
//! transactional rollback, connection cleanup and cancellation.

use std::time::Duration;

use dac_middleware::executor::commands;
use dac_middleware::prelude::*;
use dac_middleware::test_utils::{Response, ScriptedConnector, create_test_table};

fn flag_combinations() -> Vec<BatchOptions> {
    let mut all = Vec::new();
    for db in [true, false] {
        for unexpected in [true, false] {
            all.push(
                BatchOptions::default()
                    .with_throw_db_errors(db)
                    .with_throw_unexpected_errors(unexpected),
            );
        }
    }
    all
}

fn database(connector: &ScriptedConnector) -> DataBase<ScriptedConnector> {
    DataBase::new(connector.clone(), CancellationToken::new())
}

#[tokio::test]
async fn zero_status_returns_rows_affected() -> Result<(), DacError> {
    let connector = ScriptedConnector::new().respond(
        "UPDATE t SET x = 1",
        Response::rows(3).with_return_value(0),
    );
    let db = database(&connector);

    let affected = db
        .execute_non_query(Command::new("UPDATE t SET x = 1"), BatchOptions::default())
        .await?;

    assert_eq!(affected, 3);
    assert_eq!(connector.opens(), 1);
    assert_eq!(connector.closes(), 1);
    Ok(())
}

#[tokio::test]
async fn unset_status_counts_as_success() -> Result<(), DacError> {
    let connector = ScriptedConnector::new().respond("DELETE FROM t", Response::rows(2));
    let db = database(&connector);

    let affected = db
        .execute_non_query(Command::new("DELETE FROM t"), BatchOptions::default())
        .await?;
    assert_eq!(affected, 2);
    Ok(())
}

#[tokio::test]
async fn non_zero_status_is_a_business_error_under_every_flag() {
    for options in flag_combinations() {
        let connector = ScriptedConnector::new().respond(
            "EXEC close_order",
            Response::rows(1).with_return_value(42),
        );
        let db = database(&connector);

        let result = db
            .execute_non_query(Command::new("EXEC close_order"), options)
            .await;
        let outcome = ExecutionOutcome::from(result);

        assert_eq!(outcome.return_code(), Some(42), "options: {options:?}");
        assert!(matches!(
            outcome.partial_result(),
            Some(PartialResult::RowsAffected(1))
        ));
        assert_eq!(connector.closes(), 1);
    }
}

#[tokio::test]
async fn driver_failures_follow_the_db_flag() {
    let connector =
        ScriptedConnector::new().respond("SELECT broken", Response::failing("syntax error"));
    let db = database(&connector);

    let loud = db
        .execute_scalar(Command::new("SELECT broken"), BatchOptions::default())
        .await;
    match loud {
        Err(err) => assert_eq!(err.kind(), ErrorKind::Infrastructure),
        Ok(value) => panic!("expected a driver failure, got {value:?}"),
    }

    let quiet = db
        .execute_scalar(
            Command::new("SELECT broken"),
            BatchOptions::default().with_throw_db_errors(false),
        )
        .await;
    assert_eq!(quiet.ok(), Some(DbValue::Null));
    assert_eq!(connector.closes(), 2);
}

#[tokio::test]
async fn open_failure_is_classified_and_nothing_is_closed() {
    let connector = ScriptedConnector::new().fail_open();
    let db = database(&connector);

    let loud = db
        .execute_non_query(Command::new("SELECT 1"), BatchOptions::default())
        .await;
    assert_eq!(loud.err().map(|e| e.kind()), Some(ErrorKind::Infrastructure));

    let quiet = db
        .execute_non_query(Command::new("SELECT 1"), BatchOptions::suppress_all())
        .await;
    assert_eq!(quiet.ok(), Some(0));
    assert_eq!(connector.closes(), 0);
}

#[tokio::test]
async fn other_failures_follow_the_unexpected_flag() {
    let connector = ScriptedConnector::new();
    let db = database(&connector);

    let loud: Result<u64, DacError> = db
        .execute_batch(
            |_conn| Box::pin(async { Err(BatchError::other("bad mapping")) }),
            BatchOptions::default(),
        )
        .await;
    match loud {
        Err(DacError::Generic { message, .. }) => {
            assert_eq!(message, "System exception on execute SQL batch level");
        }
        other => panic!("expected a generic error, got {other:?}"),
    }

    let quiet: Result<u64, DacError> = db
        .execute_batch(
            |_conn| Box::pin(async { Err(BatchError::other("bad mapping")) }),
            BatchOptions::default().with_throw_unexpected_errors(false),
        )
        .await;
    assert_eq!(quiet.ok(), Some(0));
    assert_eq!(connector.closes(), 2);
}

#[tokio::test]
async fn custom_units_run_several_commands_on_one_connection() -> Result<(), DacError> {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .respond("INSERT b", Response::rows(2).writing(["b"]));
    let db = database(&connector);

    let first = Command::new("INSERT a");
    let second = Command::new("INSERT b");
    let total = db
        .execute_batch(
            move |conn| {
                Box::pin(async move {
                    let a = commands::non_query(conn, &first).await?;
                    let b = commands::non_query(conn, &second).await?;
                    Ok(a + b)
                })
            },
            BatchOptions::default(),
        )
        .await?;

    assert_eq!(total, 3);
    assert_eq!(connector.opens(), 1);
    assert_eq!(connector.executed(), vec!["INSERT a", "INSERT b"]);
    assert_eq!(connector.committed_writes(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn transactional_business_failure_leaves_no_writes() {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .respond(
            "INSERT b",
            Response::rows(1).writing(["b"]).with_return_value(3),
        );
    let db = database(&connector);

    let first = Command::new("INSERT a");
    let second = Command::new("INSERT b");
    let result = db
        .execute_transactional_batch(
            move |mut tx| {
                Box::pin(async move {
                    tx.non_query(&first).await?;
                    tx.non_query(&second).await
                })
            },
            BatchOptions::default(),
        )
        .await;

    assert_eq!(result.err().and_then(|e| e.return_code()), Some(3));
    assert!(connector.committed_writes().is_empty());
    assert_eq!(connector.begins(), 1);
    assert_eq!(connector.commits(), 0);
    assert_eq!(connector.rollbacks(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn transactional_success_commits_every_write() -> Result<(), DacError> {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .respond("INSERT b", Response::rows(1).writing(["b"]));
    let db = database(&connector);

    let first = Command::new("INSERT a");
    let second = Command::new("INSERT b");
    let total = db
        .execute_transactional_batch(
            move |mut tx| {
                Box::pin(async move {
                    let a = tx.non_query(&first).await?;
                    let b = tx.non_query(&second).await?;
                    Ok(a + b)
                })
            },
            BatchOptions::default(),
        )
        .await?;

    assert_eq!(total, 2);
    assert_eq!(connector.committed_writes(), vec!["a", "b"]);
    assert_eq!(connector.commits(), 1);
    assert_eq!(connector.rollbacks(), 0);
    Ok(())
}

#[tokio::test]
async fn suppressed_transactional_failure_still_rolls_back() {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .respond("INSERT b", Response::failing("constraint violation"));
    let db = database(&connector);

    let first = Command::new("INSERT a");
    let second = Command::new("INSERT b");
    let result = db
        .execute_transactional_batch(
            move |mut tx| {
                Box::pin(async move {
                    tx.non_query(&first).await?;
                    tx.non_query(&second).await
                })
            },
            BatchOptions::suppress_all(),
        )
        .await;

    assert_eq!(result.ok(), Some(0));
    assert!(connector.committed_writes().is_empty());
    assert_eq!(connector.rollbacks(), 1);
}

#[tokio::test]
async fn commit_failure_rolls_back() {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .fail_commit();
    let db = database(&connector);

    let command = Command::new("INSERT a");
    let result = db
        .execute_transactional_batch(
            move |mut tx| Box::pin(async move { tx.non_query(&command).await }),
            BatchOptions::default(),
        )
        .await;

    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Infrastructure));
    assert!(connector.committed_writes().is_empty());
    assert_eq!(connector.rollbacks(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn close_failure_accompanies_the_primary_error() {
    let connector = ScriptedConnector::new()
        .respond("EXEC p", Response::rows(0).with_return_value(9))
        .fail_close();
    let db = database(&connector);

    let err = db
        .execute_non_query(Command::new("EXEC p"), BatchOptions::default())
        .await
        .expect_err("business failure");

    assert_eq!(err.kind(), ErrorKind::Business);
    assert_eq!(err.return_code(), Some(9));
    assert_eq!(
        err.cleanup_error().map(DacError::kind),
        Some(ErrorKind::Unexpected)
    );
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn close_failure_after_success_follows_the_unexpected_flag() {
    let connector = ScriptedConnector::new()
        .respond("UPDATE t", Response::rows(4))
        .fail_close();
    let db = database(&connector);

    let loud = db
        .execute_non_query(Command::new("UPDATE t"), BatchOptions::default())
        .await;
    assert_eq!(loud.err().map(|e| e.kind()), Some(ErrorKind::Unexpected));

    let quiet = db
        .execute_non_query(
            Command::new("UPDATE t"),
            BatchOptions::default().with_throw_unexpected_errors(false),
        )
        .await;
    assert_eq!(quiet.ok(), Some(4));
}

#[tokio::test]
async fn rollback_and_close_failures_are_both_reported() {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::failing("deadlock"))
        .fail_rollback()
        .fail_close();
    let db = database(&connector);

    let command = Command::new("INSERT a");
    let err = db
        .execute_transactional_batch(
            move |mut tx| Box::pin(async move { tx.non_query(&command).await }),
            BatchOptions::default(),
        )
        .await
        .expect_err("driver failure");

    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    let cleanup = err.cleanup_error().expect("cleanup failure attached");
    assert!(cleanup.cleanup_error().is_some());
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn open_connections_can_be_left_to_drop() -> Result<(), DacError> {
    let connector = ScriptedConnector::new().respond("UPDATE t", Response::rows(1));
    let db = database(&connector);

    db.execute_non_query(
        Command::new("UPDATE t"),
        BatchOptions::default().with_close_connection(false),
    )
    .await?;
    assert_eq!(connector.closes(), 0);
    Ok(())
}

#[tokio::test]
async fn cancellation_mid_transaction_rolls_back_and_closes() {
    let connector = ScriptedConnector::new()
        .respond("INSERT a", Response::rows(1).writing(["a"]))
        .respond("WAITFOR", Response::hanging());
    let token = CancellationToken::new();
    let db = DataBase::new(connector.clone(), token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let first = Command::new("INSERT a");
    let second = Command::new("WAITFOR");
    let result = db
        .execute_transactional_batch(
            move |mut tx| {
                Box::pin(async move {
                    tx.non_query(&first).await?;
                    tx.non_query(&second).await
                })
            },
            BatchOptions::suppress_all(),
        )
        .await;
    canceller.await.expect("canceller task");

    assert!(matches!(result, Err(DacError::Cancelled)));
    assert!(connector.committed_writes().is_empty());
    assert_eq!(connector.rollbacks(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn cancellation_mid_batch_closes_once() {
    let connector = ScriptedConnector::new().respond("WAITFOR", Response::hanging());
    let token = CancellationToken::new();
    let db = DataBase::new(connector.clone(), token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let waiting = Command::new("WAITFOR");
    let result = db
        .execute_batch(
            move |conn| Box::pin(async move { commands::non_query(conn, &waiting).await }),
            BatchOptions::suppress_all(),
        )
        .await;
    canceller.await.expect("canceller task");

    assert!(matches!(result, Err(DacError::Cancelled)));
    assert_eq!(connector.opens(), 1);
    assert_eq!(connector.rollbacks(), 0);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn cancelled_token_stops_calls_before_opening() {
    let connector = ScriptedConnector::new().respond("UPDATE t", Response::rows(1));
    let token = CancellationToken::new();
    token.cancel();
    let db = DataBase::new(connector.clone(), token);

    let outcome = ExecutionOutcome::from(
        db.execute_non_query(Command::new("UPDATE t"), BatchOptions::default())
            .await,
    );
    assert!(matches!(outcome, ExecutionOutcome::Cancelled));
    assert!(connector.executed().is_empty());
    assert_eq!(connector.closes(), 0);
}

#[tokio::test]
async fn fill_loads_partial_rows_on_business_failure() {
    let rows = create_test_table(
        "",
        &["id", "name"],
        vec![
            vec![DbValue::Int(1), DbValue::Text("a".into())],
            vec![DbValue::Int(2), DbValue::Text("b".into())],
        ],
    );
    let mut data = DataSet::new();
    data.add_table(rows);
    let connector = ScriptedConnector::new().respond(
        "SELECT id, name FROM t",
        Response::data(data).with_return_value(5),
    );
    let db = database(&connector);

    let mut target = DataTable::new("t");
    let result = db
        .fill_data_table(
            Command::new("SELECT id, name FROM t"),
            &mut target,
            Paging::ALL,
            BatchOptions::default(),
        )
        .await;

    assert_eq!(result.err().and_then(|e| e.return_code()), Some(5));
    assert_eq!(target.len(), 2);
    assert_eq!(target.column_names(), ["id", "name"]);
}

#[tokio::test]
async fn paging_applies_to_the_first_table_only() -> Result<(), DacError> {
    let numbers = |count: i64| {
        create_test_table(
            "",
            &["n"],
            (0..count).map(|n| vec![DbValue::Int(n)]).collect(),
        )
    };
    let mut data = DataSet::new();
    data.add_table(numbers(10));
    data.add_table(numbers(4));
    let connector = ScriptedConnector::new().respond("SELECT n", Response::data(data));
    let db = database(&connector);

    let set = db
        .get_data_set(
            Command::new("SELECT n"),
            Paging::new(3, 2),
            BatchOptions::default(),
        )
        .await?;

    let first = set.table(0).expect("first table");
    assert_eq!(first.name(), "Table");
    assert_eq!(first.len(), 2);
    assert_eq!(first.rows()[0].get("n"), Some(&DbValue::Int(3)));
    assert_eq!(set.table(1).map(DataTable::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn blank_parameter_names_are_rejected_before_execution() {
    let connector = ScriptedConnector::new().respond("UPDATE t", Response::rows(1));
    let db = database(&connector);

    let result = db
        .execute_non_query(
            Command::new("UPDATE t").with_parameters(Parameters::new().add(" ", 1)),
            BatchOptions::default(),
        )
        .await;

    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Infrastructure));
    assert!(connector.executed().is_empty());
}

#[tokio::test]
async fn non_identifier_parameter_names_are_rejected_before_execution() {
    let connector = ScriptedConnector::new().respond("UPDATE t", Response::rows(1));
    let db = database(&connector);

    let result = db
        .command("UPDATE t")
        .param("x INT; DROP TABLE t; --", 1)
        .non_query()
        .await;

    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Infrastructure));
    assert!(connector.executed().is_empty());
}
