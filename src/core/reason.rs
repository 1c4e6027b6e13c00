//! Closed vocabulary of reasons this cell gives when failing a task.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason passed to the store's fail operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The task's container is gone.
    MissingContainer,
    /// The runtime refused to run the container.
    FailedToRunContainer,
    /// Completing the task hit a state-transition conflict.
    InvalidTransition,
    /// The result file could not be retrieved.
    FailedToFetchResult,
}

impl FailureReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::MissingContainer,
        Self::FailedToRunContainer,
        Self::InvalidTransition,
        Self::FailedToFetchResult,
    ];

    /// Wire text stored on the task record.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingContainer => "task container does not exist",
            Self::FailedToRunContainer => "failed to run container",
            Self::InvalidTransition => "invalid state transition",
            Self::FailedToFetchResult => "failed to fetch result",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_text_is_distinct() {
        let mut texts: Vec<_> = FailureReason::ALL.iter().map(|r| r.as_str()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), FailureReason::ALL.len());
        assert_eq!(
            FailureReason::FailedToFetchResult.to_string(),
            "failed to fetch result"
        );
    }
}
