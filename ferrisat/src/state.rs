//! Miscellaneous solver state.
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Satisfiability state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
    Unsat,
    UnsatUnderAssumptions,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Miscellaneous solver state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
pub struct SolverState {
    pub sat_state: SatState,
    /// Set from other threads to make the search return with an unknown result.
    ///
    /// Observed at the top of each schedule step and consumed when observed.
    pub interrupt_requested: Arc<AtomicBool>,
}

impl Default for SolverState {
    fn default() -> SolverState {
        SolverState {
            sat_state: SatState::default(),
            interrupt_requested: Arc::new(AtomicBool::new(false)),
        }
    }
}
