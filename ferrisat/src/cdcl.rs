//! Conflict driven clause learning.
use partial_ref::{partial, PartialRef};

use crate::analyze::analyze_conflict;
use crate::assumptions::{enqueue_assumption, EnqueueAssumption};
use crate::clause::{assess_learnt_clause, bump_clause_activity, db, decay_clause_activities};
use crate::context::{
    AnalyzeConflictP, AssignmentP, AssumptionsP, ClauseActivityP, ClauseAllocP, ClauseDbP,
    Context, HistoryP, ImplGraphP, SolverStateP, TmpDataP, TrailP, VsidsP, WatchlistsP,
};
use crate::decision::make_decision;
use crate::prop::{backtrack, enqueue_assignment, propagate, watch, Conflict, Reason};
use crate::state::SatState;

/// Find a conflict, learn a clause and backtrack.
///
/// When no conflict is left the solver state is set to the final result instead.
pub fn conflict_step(
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
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) {
    let conflict = match find_conflict(ctx.borrow()) {
        Ok(()) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
            return;
        }
        Err(FoundConflict::Assumption) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::UnsatUnderAssumptions;
            return;
        }
        Err(FoundConflict::Conflict(conflict)) => conflict,
    };

    let conflict_trail_depth = ctx.part(TrailP).trail().len();

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    for &cref in analyze.involved() {
        bump_clause_activity(ctx.borrow(), cref);
    }

    decay_clause_activities(ctx.borrow());

    backtrack(ctx.borrow(), backtrack_to);

    let clause = analyze.clause();

    if clause.is_empty() {
        ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        return;
    }

    // The glue level is computed while the levels of the pre-backjump assignment are still
    // present, so it is one higher than after the asserted literal propagates.
    let header = assess_learnt_clause(ctx.borrow(), clause);
    let glue = header.glue();

    let reason = match clause[..] {
        [_] => Reason::None,
        [_, lit_1] => {
            ctx.part_mut(WatchlistsP)
                .add_binary([clause[0], lit_1], true);
            Reason::Binary([lit_1])
        }
        [_, lit_1, lit_2] => {
            ctx.part_mut(WatchlistsP)
                .add_ternary([clause[0], lit_1, lit_2], true);
            Reason::Ternary([lit_1, lit_2])
        }
        _ => {
            let cref = db::add_clause(ctx.borrow(), header, clause);
            watch::attach_clause(ctx.borrow(), cref);
            Reason::Long(cref)
        }
    };

    enqueue_assignment(ctx.borrow(), clause[0], reason);

    ctx.part_mut(HistoryP)
        .record_conflict(glue, conflict_trail_depth);
}

/// Return type of [`find_conflict`].
///
/// Specifies whether a conflict was found during propagation or while enqueuing assumptions.
enum FoundConflict {
    Conflict(Conflict),
    Assumption,
}

impl From<Conflict> for FoundConflict {
    fn from(conflict: Conflict) -> FoundConflict {
        FoundConflict::Conflict(conflict)
    }
}

/// Find a conflict.
///
/// Returns `Err` if a conflict was found and `Ok` if a satisfying assignment was found instead.
fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) -> Result<(), FoundConflict> {
    loop {
        propagate(ctx.borrow())?;

        match enqueue_assumption(ctx.borrow()) {
            EnqueueAssumption::Enqueued => continue,
            EnqueueAssumption::Conflict => return Err(FoundConflict::Assumption),
            EnqueueAssumption::Done => (),
        }

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}
