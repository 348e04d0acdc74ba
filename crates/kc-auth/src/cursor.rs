//! Resume cursor for suspended authentication attempts.
//!
//! A challenged attempt is captured as a stack of frames, one per flow from
//! the root down to the flow holding the challenged authenticator. The
//! cursor is plain data: callers may serialize it between requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decided status of an execution, replayed on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// The execution succeeded.
    Success,
    /// The execution failed.
    Failure,
    /// The execution did not apply.
    Attempted,
}

/// Suspension point within one flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowFrame {
    /// Flow this frame belongs to.
    pub flow_id: Uuid,
    /// Executions already decided in this flow, in evaluation order.
    pub decided: Vec<(Uuid, ExecutionStatus)>,
    /// Execution the attempt is suspended on. For all but the last frame
    /// this is the execution nesting the next frame's flow.
    pub suspended_execution: Uuid,
    /// Position of the suspended execution among its ordered siblings.
    pub index: usize,
    /// Config bound to the suspended execution when it suspended.
    pub config_id: Option<Uuid>,
}

impl FlowFrame {
    /// Looks up the replayed status of an execution.
    #[must_use]
    pub fn status_of(&self, execution_id: Uuid) -> Option<ExecutionStatus> {
        self.decided
            .iter()
            .find(|(id, _)| *id == execution_id)
            .map(|(_, status)| *status)
    }
}

/// Everything needed to continue a challenged attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCursor {
    /// Authentication attempt ID.
    pub attempt_id: Uuid,
    /// Realm ID.
    pub realm_id: Uuid,
    /// Root flow the attempt started from.
    pub flow_id: Uuid,
    /// Frames from the root flow down to the challenged authenticator.
    pub frames: Vec<FlowFrame>,
    /// User identified so far.
    pub user_id: Option<Uuid>,
    /// Attempt notes at the time of suspension.
    pub notes: HashMap<String, String>,
}

impl ResumeCursor {
    /// The execution whose authenticator raised the challenge.
    #[must_use]
    pub fn challenged_execution(&self) -> Option<Uuid> {
        self.frames.last().map(|f| f.suspended_execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_json() {
        let leaf = Uuid::now_v7();
        let cursor = ResumeCursor {
            attempt_id: Uuid::now_v7(),
            realm_id: Uuid::now_v7(),
            flow_id: Uuid::now_v7(),
            frames: vec![FlowFrame {
                flow_id: Uuid::now_v7(),
                decided: vec![(Uuid::now_v7(), ExecutionStatus::Attempted)],
                suspended_execution: leaf,
                index: 1,
                config_id: None,
            }],
            user_id: None,
            notes: HashMap::from([("k".to_string(), "v".to_string())]),
        };

        let json = serde_json::to_string(&cursor).unwrap();
        assert!(json.contains("\"ATTEMPTED\""));
        assert!(json.contains("suspendedExecution"));

        let back: ResumeCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
        assert_eq!(back.challenged_execution(), Some(leaf));
    }

    #[test]
    fn frame_status_lookup() {
        let decided = Uuid::now_v7();
        let frame = FlowFrame {
            flow_id: Uuid::now_v7(),
            decided: vec![(decided, ExecutionStatus::Success)],
            suspended_execution: Uuid::now_v7(),
            index: 1,
            config_id: None,
        };

        assert_eq!(frame.status_of(decided), Some(ExecutionStatus::Success));
        assert_eq!(frame.status_of(Uuid::now_v7()), None);
    }
}
