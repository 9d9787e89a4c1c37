use crate::error::{DacError, ErrorKind, PartialResult};

/// Exactly one of the four ways an executor call can end, plus cancellation.
///
/// Convert any executor result with `ExecutionOutcome::from` to branch on the tier
/// without matching on [`DacError`] variants.
#[derive(Debug)]
pub enum ExecutionOutcome<T> {
    Success(T),
    /// Non-zero return code; the error carries the code and the partial result.
    BusinessError(DacError),
    InfrastructureError(DacError),
    UnexpectedError(DacError),
    Cancelled,
}

impl<T> ExecutionOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    /// Return code of a business error.
    #[must_use]
    pub fn return_code(&self) -> Option<i32> {
        match self {
            ExecutionOutcome::BusinessError(err) => err.return_code(),
            _ => None,
        }
    }

    /// Partial result of a business error.
    #[must_use]
    pub fn partial_result(&self) -> Option<&PartialResult> {
        match self {
            ExecutionOutcome::BusinessError(err) => err.partial_result(),
            _ => None,
        }
    }

    /// Back to a plain `Result`.
    ///
    /// # Errors
    /// Every variant but `Success`.
    pub fn into_result(self) -> Result<T, DacError> {
        match self {
            ExecutionOutcome::Success(value) => Ok(value),
            ExecutionOutcome::BusinessError(err)
            | ExecutionOutcome::InfrastructureError(err)
            | ExecutionOutcome::UnexpectedError(err) => Err(err),
            ExecutionOutcome::Cancelled => Err(DacError::Cancelled),
        }
    }
}

impl<T> From<Result<T, DacError>> for ExecutionOutcome<T> {
    fn from(result: Result<T, DacError>) -> Self {
        match result {
            Ok(value) => ExecutionOutcome::Success(value),
            Err(err) => match err.kind() {
                ErrorKind::Business => ExecutionOutcome::BusinessError(err),
                ErrorKind::Infrastructure => ExecutionOutcome::InfrastructureError(err),
                ErrorKind::Unexpected => ExecutionOutcome::UnexpectedError(err),
                ErrorKind::Cancelled => ExecutionOutcome::Cancelled,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    #[test]
    fn errors_land_in_their_tier() {
        let business: ExecutionOutcome<u64> =
            Err(DacError::returned_error_code(42, PartialResult::RowsAffected(2))).into();
        assert_eq!(business.return_code(), Some(42));
        assert!(matches!(
            business.partial_result(),
            Some(PartialResult::RowsAffected(2))
        ));

        let infra: ExecutionOutcome<u64> = Err(DacError::SqlExecution(
            DriverError::ConnectionError("refused".into()),
        ))
        .into();
        assert!(matches!(infra, ExecutionOutcome::InfrastructureError(_)));

        let cancelled: ExecutionOutcome<u64> = Err(DacError::Cancelled).into();
        assert!(matches!(cancelled.into_result(), Err(DacError::Cancelled)));

        let ok: ExecutionOutcome<u64> = Ok(3).into();
        assert!(ok.is_success());
    }
}
