//! Job outcome and lifecycle

use serde::{Deserialize, Serialize};

use super::job::{JobKey, Variables};

/// Result of running one job, consumed by the completion reporter
///
/// Exactly one outcome exists per job. Retries after a failure are the
/// broker's business once the failure is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    Completed {
        job_key: JobKey,
        output_variables: Variables,
    },
    Failed {
        job_key: JobKey,
        error_message: String,
    },
}

impl JobOutcome {
    pub fn completed(job_key: JobKey, output_variables: Variables) -> Self {
        Self::Completed {
            job_key,
            output_variables,
        }
    }

    pub fn failed(job_key: JobKey, error_message: impl Into<String>) -> Self {
        Self::Failed {
            job_key,
            error_message: error_message.into(),
        }
    }

    pub fn job_key(&self) -> JobKey {
        match self {
            Self::Completed { job_key, .. } | Self::Failed { job_key, .. } => *job_key,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The lifecycle state this outcome moves a job into
    pub fn state(&self) -> JobState {
        match self {
            Self::Completed { .. } => JobState::Completed,
            Self::Failed { .. } => JobState::Failed,
        }
    }
}

/// Client-side lifecycle of a job
///
/// `Activated → Dispatched → {Completed | Failed} → Reported`. `Reported` is
/// terminal whether or not the report call itself succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Activated,
    Dispatched,
    Completed,
    Failed,
    Reported,
}

impl JobState {
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        matches!(
            (self, next),
            (Activated, Dispatched)
                | (Activated, Failed)
                | (Dispatched, Completed)
                | (Dispatched, Failed)
                | (Completed, Reported)
                | (Failed, Reported)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == JobState::Reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let done = JobOutcome::completed(JobKey(1), Variables::new());
        let failed = JobOutcome::failed(JobKey(2), "no stock");

        assert_eq!(done.job_key(), JobKey(1));
        assert!(done.is_completed());
        assert_eq!(done.state(), JobState::Completed);

        assert_eq!(failed.job_key(), JobKey(2));
        assert!(!failed.is_completed());
        assert_eq!(failed.state(), JobState::Failed);
    }

    #[test]
    fn test_lifecycle_transitions() {
        use JobState::*;

        assert!(Activated.can_transition_to(Dispatched));
        assert!(Dispatched.can_transition_to(Completed));
        assert!(Dispatched.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Reported));
        assert!(Failed.can_transition_to(Reported));

        // Undecodable payloads fail before reaching a handler
        assert!(Activated.can_transition_to(Failed));

        assert!(!Activated.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Reported.can_transition_to(Activated));
        assert!(Reported.is_terminal());
    }
}
