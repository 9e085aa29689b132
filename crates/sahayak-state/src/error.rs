use thiserror::Error;

/// Errors from state machine transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The transition is not allowed from the current state.
    #[error("invalid {machine} transition: {from} -> {to}")]
    InvalidTransition {
        /// Which machine rejected the transition.
        machine: &'static str,
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// The trip has completed; no further positions or transitions apply.
    #[error("trip is completed")]
    TripCompleted,

    /// A relay timer fired for an episode that has since been flushed or
    /// cancelled.
    #[error("stale relay episode {fired}, current episode is {current}")]
    StaleEpisode {
        /// Episode the timer was armed for.
        fired: u64,
        /// Episode currently in progress.
        current: u64,
    },
}
