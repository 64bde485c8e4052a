/// Progress of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Constructed, nothing exchanged yet.
    Initialized,
    /// Initiator wrote act 1.
    Act1Sent,
    /// Responder validated act 1.
    Act1Received,
    /// Responder wrote act 2.
    Act2Sent,
    /// Initiator validated act 2.
    Act2Received,
    /// Act 3 written or validated; transport keys handed out.
    Complete,
    /// A message failed validation. Terminal.
    Failed,
}

/// One operation on the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    WriteActOne,
    ReadActOne,
    WriteActTwo,
    ReadActTwo,
    WriteActThree,
    ReadActThree,
}

impl HandshakeState {
    /// The state reached by performing `step`, or `None` if `step` is not
    /// legal here.
    pub(crate) fn after(self, step: Step) -> Option<Self> {
        use HandshakeState::*;

        match (self, step) {
            // initiator
            (Initialized, Step::WriteActOne) => Some(Act1Sent),
            (Act1Sent, Step::ReadActTwo) => Some(Act2Received),
            (Act2Received, Step::WriteActThree) => Some(Complete),
            // responder
            (Initialized, Step::ReadActOne) => Some(Act1Received),
            (Act1Received, Step::WriteActTwo) => Some(Act2Sent),
            (Act2Sent, Step::ReadActThree) => Some(Complete),
            _ => None,
        }
    }

    /// Whether no further step is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}
