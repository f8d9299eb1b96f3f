//! Solver configuration.

/// Configurable parameters used during solving.
pub struct SolverConfig {
    /// Initial value of the variable activity bump. (Default: 128)
    pub vsids_var_inc_init: u32,

    /// Per-conflict growth of the variable activity bump, numerator. (Default: 21)
    pub vsids_growth_numer: u32,

    /// Per-conflict growth of the variable activity bump, denominator. (Default: 20)
    pub vsids_growth_denom: u32,

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_activity_decay: f32,

    /// Window size of the short-term glue average. (Default: 50)
    pub restart_glue_window: usize,

    /// A restart is forced when the short-term glue average exceeds the long-term average times
    /// this factor. (Default: 1.25)
    pub restart_glue_factor: f64,

    /// Glue based restarts are blocked while the trail is deeper than the long-term trail depth
    /// average times this factor. (Default: 1.4)
    pub restart_blocking_factor: f64,

    /// Initial conflict interval of the geometric restart fallback. (Default: 1000)
    pub restart_geometric_interval: u64,

    /// Growth factor of the geometric restart interval. (Default: 1.5)
    pub restart_geometric_mult: f64,

    /// Number of learnt long clauses that triggers a clause database reduction. (Default: 2000)
    pub reduce_base: u64,

    /// Increase of the reduction threshold after each reduction. (Default: 300)
    pub reduce_increment: u64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            vsids_var_inc_init: 128,
            vsids_growth_numer: 21,
            vsids_growth_denom: 20,
            clause_activity_decay: 0.999,
            restart_glue_window: 50,
            restart_glue_factor: 1.25,
            restart_blocking_factor: 1.4,
            restart_geometric_interval: 1000,
            restart_geometric_mult: 1.5,
            reduce_base: 2000,
            reduce_increment: 300,
        }
    }
}
