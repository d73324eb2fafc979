/// Run state of the frame loop.
///
/// Starts `Running` and moves to `Closing` exactly once; there is no way back.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum LoopState {
    #[default]
    Running,
    Closing,
}

impl LoopState {
    /// Whether termination has been requested.
    pub fn should_close(self) -> bool {
        self == Self::Closing
    }

    /// Moves to `Closing`. Returns `true` only for the call that made the
    /// transition, so teardown attached to it runs once.
    pub fn request_close(&mut self) -> bool {
        match self {
            Self::Running => {
                *self = Self::Closing;
                true
            }
            Self::Closing => false,
        }
    }
}
