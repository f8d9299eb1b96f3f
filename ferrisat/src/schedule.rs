//! Scheduling of the solving steps.
//!
//! The schedule drives the search loop: it observes the interrupt flag and the conflict budget,
//! decides when to restart and when to reduce the clause database, and logs progress.
use std::sync::atomic::Ordering;

use log::info;

use partial_ref::{partial, PartialRef};

use crate::cdcl::conflict_step;
use crate::clause::{collect_garbage_now, reduce::reduce_learnts};
use crate::context::{
    AnalyzeConflictP, AssignmentP, AssumptionsP, ClauseActivityP, ClauseAllocP, ClauseDbP,
    Context, HistoryP, ImplGraphP, ScheduleP, SolverConfigP, SolverStateP, TmpDataP, TrailP,
    VsidsP, WatchlistsP,
};
use crate::prop::{full_restart, restart};
use crate::state::SatState;

/// A running average over a bounded window of recent samples.
struct BoundedAverage {
    values: std::collections::VecDeque<u64>,
    capacity: usize,
    sum: u64,
}

impl BoundedAverage {
    fn new(capacity: usize) -> BoundedAverage {
        BoundedAverage {
            values: std::collections::VecDeque::with_capacity(capacity),
            capacity,
            sum: 0,
        }
    }

    fn push(&mut self, value: u64) {
        if self.values.len() == self.capacity {
            self.sum -= self.values.pop_front().unwrap();
        }
        self.values.push_back(value);
        self.sum += value;
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    fn clear(&mut self) {
        self.values.clear();
        self.sum = 0;
    }

    fn average(&self) -> f64 {
        self.sum as f64 / self.values.len().max(1) as f64
    }
}

/// A running average over all samples seen so far.
#[derive(Default)]
struct LongTermAverage {
    sum: u64,
    count: u64,
}

impl LongTermAverage {
    fn push(&mut self, value: u64) {
        self.sum += value;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        self.sum as f64 / self.count.max(1) as f64
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Short and long window statistics of the ongoing search.
///
/// Used by the restart heuristic: a burst of high glue learnt clauses relative to the long-term
/// average indicates that the search went stale, while an unusually deep trail indicates that the
/// search is about to complete an assignment and should not be disturbed.
pub struct SearchHistory {
    glue_short: BoundedAverage,
    glue_long: LongTermAverage,
    trail_long: LongTermAverage,
    /// Trail depth of the most recent conflict.
    last_trail_depth: u64,
}

impl Default for SearchHistory {
    fn default() -> SearchHistory {
        SearchHistory {
            glue_short: BoundedAverage::new(
                crate::config::SolverConfig::default().restart_glue_window,
            ),
            glue_long: LongTermAverage::default(),
            trail_long: LongTermAverage::default(),
            last_trail_depth: 0,
        }
    }
}

impl SearchHistory {
    /// Record the learnt clause glue and trail depth of a conflict.
    pub fn record_conflict(&mut self, glue: usize, trail_depth: usize) {
        self.glue_short.push(glue as u64);
        self.glue_long.push(glue as u64);
        self.trail_long.push(trail_depth as u64);
        self.last_trail_depth = trail_depth as u64;
    }

    /// Forget the short-term window, done on every restart.
    pub fn clear_short(&mut self) {
        self.glue_short.clear();
    }

    /// Change the size of the short-term glue window, dropping its current contents.
    pub fn set_glue_window(&mut self, capacity: usize) {
        self.glue_short = BoundedAverage::new(capacity);
    }

    /// Whether the recently learnt clauses have a worse glue level than the long-term average.
    fn glue_degraded(&self, factor: f64) -> bool {
        self.glue_short.is_full()
            && self.glue_short.average() > self.glue_long.average() * factor
    }

    /// Whether the trail is currently much deeper than usual.
    fn trail_unusually_deep(&self, factor: f64) -> bool {
        self.trail_long.count() >= 100
            && self.last_trail_depth as f64 > self.trail_long.average() * factor
    }
}

/// Scheduling of restarts, reductions and solving steps.
#[derive(Default)]
pub struct Schedule {
    conflicts: u64,
    restarts: u64,
    reductions: u64,
    conflicts_at_last_restart: u64,
    /// Current conflict interval of the geometric restart fallback, zero until initialized from
    /// the configuration.
    geometric_interval: u64,
    /// Learnt long clause count that triggers the next reduction, zero until initialized.
    reduce_threshold: u64,
    /// Total conflict count at which the current solve call gives up.
    conflict_ceiling: Option<u64>,
}

impl Schedule {
    /// Limit the current solve call to the given number of additional conflicts.
    pub fn set_conflict_budget(&mut self, budget: Option<u64>) {
        self.conflict_ceiling = budget.map(|budget| self.conflicts + budget);
    }
}

/// Perform one step of the search schedule.
///
/// Returns `false` when the search is finished or gave up, i.e. when the solver state is decided,
/// the conflict budget is exhausted or an interrupt was requested.
pub fn schedule_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut HistoryP,
        mut ImplGraphP,
        mut ScheduleP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) -> bool {
    if ctx.part(SolverStateP).sat_state != SatState::Unknown {
        return false;
    }

    if ctx
        .part(SolverStateP)
        .interrupt_requested
        .swap(false, Ordering::Relaxed)
    {
        // Unwind so that the level 0 state stays valid for the caller.
        full_restart(ctx.borrow());
        info!("interrupted");
        return false;
    }

    let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);
    let (config, mut ctx) = ctx.split_part(SolverConfigP);

    if schedule.geometric_interval == 0 {
        schedule.geometric_interval = config.restart_geometric_interval;
        schedule.reduce_threshold = config.reduce_base;
    }

    if let Some(ceiling) = schedule.conflict_ceiling {
        if schedule.conflicts >= ceiling {
            full_restart(ctx.borrow());
            info!("conflict budget exhausted");
            return false;
        }
    }

    if schedule.conflicts > 0 && schedule.conflicts % 5000 == 0 {
        let db = ctx.part(ClauseDbP);
        let units = ctx.part(TrailP).top_level_assignment_count();
        info!(
            "confl: {}k rest: {} red: {} vars: {} bin: {} tern: {} irred: {} learnt: {}",
            schedule.conflicts / 1000,
            schedule.restarts,
            schedule.reductions,
            ctx.part(AssignmentP).assignment().len() - units,
            ctx.part(WatchlistsP).binary_count(),
            ctx.part(WatchlistsP).ternary_count(),
            db.irredundant_count(),
            db.redundant_count(),
        );
    }

    // Restart when the recently learnt clauses degraded, unless the search looks like it is
    // getting somewhere, with a geometric schedule as fallback for formulas where glue stays
    // flat.
    let since_restart = schedule.conflicts - schedule.conflicts_at_last_restart;
    let geometric_restart = since_restart >= schedule.geometric_interval;
    let glue_restart = {
        let history = ctx.part(HistoryP);
        history.glue_degraded(config.restart_glue_factor)
            && !history.trail_unusually_deep(config.restart_blocking_factor)
    };

    if since_restart > 0 && (geometric_restart || glue_restart) {
        restart(ctx.borrow());
        ctx.part_mut(HistoryP).clear_short();
        schedule.restarts += 1;
        schedule.conflicts_at_last_restart = schedule.conflicts;
        if geometric_restart {
            schedule.geometric_interval =
                (schedule.geometric_interval as f64 * config.restart_geometric_mult) as u64;
        }
    }

    if ctx.part(ClauseDbP).redundant_count() as u64 > schedule.reduce_threshold {
        reduce_learnts(ctx.borrow());
        collect_garbage_now(ctx.borrow());
        schedule.reductions += 1;
        schedule.reduce_threshold += config.reduce_increment;
        info!(
            "reduced clause db to {} learnt clauses",
            ctx.part(ClauseDbP).redundant_count()
        );
    }

    conflict_step(ctx.borrow());
    schedule.conflicts += 1;

    true
}
