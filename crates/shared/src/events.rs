//! Tool execution events for real-time status updates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolEvent {
    /// Tool execution started
    Started { execution_id: Uuid, kind: ToolKind },
    /// Progress update during execution (one per video poll)
    Progress {
        execution_id: Uuid,
        message: String,
        attempt: Option<u32>,
    },
    /// Tool execution completed successfully
    Completed {
        execution_id: Uuid,
        duration_ms: u64,
    },
    /// Tool execution failed, was cancelled or timed out
    Failed {
        execution_id: Uuid,
        error: String,
        duration_ms: u64,
    },
}

impl ToolEvent {
    pub fn execution_id(&self) -> Uuid {
        match self {
            ToolEvent::Started { execution_id, .. } => *execution_id,
            ToolEvent::Progress { execution_id, .. } => *execution_id,
            ToolEvent::Completed { execution_id, .. } => *execution_id,
            ToolEvent::Failed { execution_id, .. } => *execution_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolEvent::Completed { .. } | ToolEvent::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_id_accessor() {
        let id = Uuid::new_v4();
        let event = ToolEvent::Progress {
            execution_id: id,
            message: "Polling".into(),
            attempt: Some(2),
        };
        assert_eq!(event.execution_id(), id);
        assert!(!event.is_terminal());
        assert!(ToolEvent::Completed {
            execution_id: id,
            duration_ms: 5
        }
        .is_terminal());
    }
}
