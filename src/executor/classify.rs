use tracing::{error, warn};

use super::BatchOptions;
use crate::error::{BatchError, DacError, messages};

/// Result of the main part of a call, before cleanup is accounted for.
pub(super) enum Attempt<T> {
    Ok(T),
    Suppressed,
    Failed(DacError),
}

/// Map a unit-of-work failure onto the error taxonomy.
///
/// Already classified errors (return codes, cancellation, nested calls) pass through
/// untouched; driver and other failures obey their flag.
pub(super) fn classify<T>(err: BatchError, options: &BatchOptions) -> Attempt<T> {
    match err {
        BatchError::Classified(err) => Attempt::Failed(err),
        BatchError::Driver(err) => {
            if options.throw_db_errors {
                Attempt::Failed(DacError::SqlExecution(err))
            } else {
                warn!(error = %err, "database error suppressed");
                Attempt::Suppressed
            }
        }
        BatchError::Other(err) => {
            if options.throw_unexpected_errors {
                Attempt::Failed(DacError::generic(
                    messages::SYSTEM_EXCEPTION_ON_EXECUTE_SQL_BATCH_LEVEL,
                    Some(err),
                ))
            } else {
                warn!(error = %err, "unexpected error suppressed");
                Attempt::Suppressed
            }
        }
    }
}

/// Combine the main attempt with the outcome of close/rollback.
///
/// A cleanup failure never replaces a primary error; it rides along with it when
/// unexpected errors are thrown and is only logged otherwise.
pub(super) fn finish<T: Default>(
    attempt: Attempt<T>,
    cleanup: Option<DacError>,
    options: &BatchOptions,
) -> Result<T, DacError> {
    match (attempt, cleanup) {
        (Attempt::Ok(value), None) => Ok(value),
        (Attempt::Suppressed, None) => Ok(T::default()),
        (Attempt::Failed(err), None) => Err(err),
        (Attempt::Failed(primary), Some(cleanup)) => {
            if options.throw_unexpected_errors {
                error!(error = %primary, cleanup = %cleanup, "cleanup failed after error");
                Err(DacError::CleanupFailed {
                    primary: Box::new(primary),
                    cleanup: Box::new(cleanup),
                })
            } else {
                warn!(error = %primary, cleanup = %cleanup, "cleanup failure suppressed");
                Err(primary)
            }
        }
        (attempt @ (Attempt::Ok(_) | Attempt::Suppressed), Some(cleanup)) => {
            if options.throw_unexpected_errors {
                error!(cleanup = %cleanup, "cleanup failed");
                Err(cleanup)
            } else {
                warn!(cleanup = %cleanup, "cleanup failure suppressed");
                match attempt {
                    Attempt::Ok(value) => Ok(value),
                    _ => Ok(T::default()),
                }
            }
        }
    }
}

/// Merge two cleanup failures (rollback, then close) into one.
pub(super) fn join_cleanup(first: Option<DacError>, second: Option<DacError>) -> Option<DacError> {
    match (first, second) {
        (Some(first), Some(second)) => Some(DacError::CleanupFailed {
            primary: Box::new(first),
            cleanup: Box::new(second),
        }),
        (first, second) => first.or(second),
    }
}
