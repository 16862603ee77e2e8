use offset_auditor::error::AuditError;
use std::process::ExitCode;
use tracing::error;

/// Exit status of a command that ran to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Some groups or partitions failed; the rest was processed.
    CompletedWithFailures,
}

impl RunOutcome {
    pub fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            RunOutcome::Completed
        } else {
            RunOutcome::CompletedWithFailures
        }
    }
}

impl From<RunOutcome> for ExitCode {
    fn from(value: RunOutcome) -> Self {
        match value {
            RunOutcome::Completed => ExitCode::SUCCESS,
            RunOutcome::CompletedWithFailures => ExitCode::from(2),
        }
    }
}

#[derive(Debug)]
pub enum ApplicationError {
    InvalidArgument(anyhow::Error),
    Unavailable(anyhow::Error),
    Audit(AuditError),
}

impl From<AuditError> for ApplicationError {
    fn from(value: AuditError) -> Self {
        ApplicationError::Audit(value)
    }
}

impl From<ApplicationError> for ExitCode {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::InvalidArgument(e) | ApplicationError::Unavailable(e) => {
                error!("{e:?}")
            }
            ApplicationError::Audit(e) => error!("{}", e.report()),
        }
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_reflects_failure_count() {
        assert_eq!(RunOutcome::from_failures(0), RunOutcome::Completed);
        assert_eq!(
            RunOutcome::from_failures(3),
            RunOutcome::CompletedWithFailures
        );
    }
}
