#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tremor,
    Bouncing,
}

impl Phase {
    pub fn is_bouncing(self) -> bool {
        matches!(self, Self::Bouncing)
    }
}

pub fn can_transition_phase(from: Phase, to: Phase) -> bool {
    matches!((from, to), (Phase::Tremor, Phase::Bouncing)) || from == to
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    Idle,
    Running,
    TearingDown,
    Closed,
}

impl SessionLifecycle {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

pub fn can_transition(from: SessionLifecycle, to: SessionLifecycle) -> bool {
    matches!(
        (from, to),
        (SessionLifecycle::Idle, SessionLifecycle::Running)
            | (SessionLifecycle::Idle, SessionLifecycle::TearingDown)
            | (SessionLifecycle::Running, SessionLifecycle::TearingDown)
            | (SessionLifecycle::TearingDown, SessionLifecycle::Closed)
    ) || from == to
}
