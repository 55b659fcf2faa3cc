use std::fmt;

/// Where the orchestrator is in handling a turn.
///
/// `Idle → AwaitingResponse → {TurnCommitted | TurnFailed}`. The two final
/// states are also the resting state between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse,
    TurnCommitted,
    TurnFailed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingResponse => "awaiting_response",
            Self::TurnCommitted => "turn_committed",
            Self::TurnFailed => "turn_failed",
        };
        f.write_str(name)
    }
}
