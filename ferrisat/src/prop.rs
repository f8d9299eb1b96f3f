//! Unit propagation.
pub mod assignment;
pub mod graph;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, full_restart, restart, Assignment, Trail};
pub use graph::{Conflict, ImplGraph, ImplNode, Reason};
pub use watch::{Watch, Watchlists};

use partial_ref::{partial, PartialRef};

use ferrisat_formula::Lit;

use crate::context::{AssignmentP, ClauseAllocP, Context, ImplGraphP, TrailP, WatchlistsP};

/// Propagate all enqueued assignments.
///
/// Propagation is performed in the queue order of the trail. On conflict the clause that became
/// falsified is returned and the remaining queue is left unprocessed.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part_mut(TrailP).pop_queue() {
        propagate_assignment(ctx.borrow(), lit)?;
    }
    Ok(())
}

/// Propagate all clauses watched by the negation of an assigned literal.
///
/// Entries of the walked list are handled in order. Binary and ternary entries are always kept.
/// A long entry is kept unless its watch migrates to another literal's list, in which case it is
/// dropped from the current list; the walk uses a separate read and write position so a migrated
/// entry is never revisited. On conflict the unprocessed tail is preserved.
fn propagate_assignment(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let (watchlists, mut ctx) = ctx.split_part_mut(WatchlistsP);
    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);

    // The literal that became false in the clauses watched here.
    let false_lit = !lit;

    let mut watches = watchlists.take(lit);

    let mut read = 0;
    let mut write = 0;
    let mut conflict = None;

    'watches: while read < watches.len() {
        let watch = watches[read];
        read += 1;

        match watch {
            Watch::Binary { other, .. } => {
                watches[write] = watch;
                write += 1;

                let assignment = ctx.part(AssignmentP);
                if assignment.lit_is_true(other) {
                    continue;
                } else if assignment.lit_is_false(other) {
                    conflict = Some(Conflict::Binary([other, false_lit]));
                    break;
                } else {
                    enqueue_assignment(ctx.borrow(), other, Reason::Binary([false_lit]));
                }
            }
            Watch::Ternary { others: [a, b], .. } => {
                watches[write] = watch;
                write += 1;

                let assignment = ctx.part(AssignmentP);
                if assignment.lit_is_true(a) || assignment.lit_is_true(b) {
                    continue;
                }
                match (assignment.lit_is_false(a), assignment.lit_is_false(b)) {
                    (true, true) => {
                        conflict = Some(Conflict::Ternary([a, b, false_lit]));
                        break;
                    }
                    (false, true) => {
                        enqueue_assignment(ctx.borrow(), a, Reason::Ternary([b, false_lit]))
                    }
                    (true, false) => {
                        enqueue_assignment(ctx.borrow(), b, Reason::Ternary([a, false_lit]))
                    }
                    // With two unassigned literals left the clause is neither unit nor
                    // conflicting.
                    (false, false) => (),
                }
            }
            Watch::Long { cref, blocking } => {
                // If the blocking literal (which is part of the watched clause) is already true,
                // the watched clause is satisfied and we don't even have to look at it.
                if ctx.part(AssignmentP).lit_is_true(blocking) {
                    watches[write] = watch;
                    write += 1;
                    continue;
                }

                let lits = alloc.clause_mut(cref).lits_mut();

                // First we ensure that the literal we're currently propagating is at index 1.
                // This prepares the literal order for further propagations, as the propagating
                // literal has to be at index 0.
                if lits[0] == false_lit {
                    lits.swap(0, 1);
                }
                debug_assert_eq!(lits[1], false_lit);

                let first = lits[0];

                // The new watch uses the other watched literal as blocking literal. It either
                // replaces the currently processed watch or is added to another literal's
                // watchlist.
                let new_watch = Watch::Long {
                    cref,
                    blocking: first,
                };

                // If the other watched literal isn't the blocking literal we already checked,
                // check whether it is true. If so nothing else needs to be done.
                if first != blocking && ctx.part(AssignmentP).lit_is_true(first) {
                    watches[write] = new_watch;
                    write += 1;
                    continue;
                }

                // Try to find a non-false unwatched literal to replace our current literal as the
                // watched literal.
                for i in 2..lits.len() {
                    let rest_lit = lits[i];
                    if !ctx.part(AssignmentP).lit_is_false(rest_lit) {
                        // Found one; make it a watched literal by reordering the literals and
                        // adding the watch to the corresponding watchlist. The current entry is
                        // dropped, the watch migrated.
                        lits[1] = rest_lit;
                        lits[i] = false_lit;

                        debug_assert_ne!(!rest_lit, lit);
                        watchlists.add_watch(!rest_lit, new_watch);
                        continue 'watches;
                    }
                }

                // We didn't find a non-false unwatched literal, so either we're propagating or we
                // have a conflict.
                watches[write] = new_watch;
                write += 1;

                if ctx.part(AssignmentP).lit_is_false(first) {
                    conflict = Some(Conflict::Long(cref));
                    break;
                }

                enqueue_assignment(ctx.borrow(), first, Reason::Long(cref));
            }
        }
    }

    // Keep the unprocessed tail when the walk stopped early on a conflict.
    while read < watches.len() {
        watches[write] = watches[read];
        write += 1;
        read += 1;
    }
    watches.truncate(write);

    watchlists.restore(lit, watches);

    match conflict {
        None => Ok(()),
        Some(conflict) => Err(conflict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use ferrisat_formula::{cnf_formula, lit, lits};

    use crate::clause::{db, ClauseHeader};
    use crate::context::set_var_count;
    use crate::load::load_clause;

    #[test]
    fn binary_and_ternary_chains_propagate() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let formula = cnf_formula![
            1;
            -1, 2;
            -2, 3, 4;
            -3;
            -4, 5;
        ];

        set_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }

        assert!(propagate(ctx.borrow()).is_ok());

        for lit in lits![1, 2, -3, 4, 5].iter() {
            assert!(ctx.part(AssignmentP).lit_is_true(*lit));
        }
        assert!(ctx.part(TrailP).fully_propagated());
    }

    #[test]
    fn long_clause_watch_migrates_before_becoming_unit() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 6);

        let mut header = ClauseHeader::new();
        header.set_redundant(false);
        let lits = lits![1, 2, 3, 4];
        let cref = db::add_clause(ctx.borrow(), header, &lits);
        watch::attach_clause(ctx.borrow(), cref);

        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::None);
        assert!(propagate(ctx.borrow()).is_ok());
        // The clause still has two non-false literals, nothing was propagated.
        assert!(ctx.part(AssignmentP).lit_is_unk(lit!(2)));

        enqueue_assignment(ctx.borrow(), lit!(-3), Reason::None);
        enqueue_assignment(ctx.borrow(), lit!(-4), Reason::None);
        assert!(propagate(ctx.borrow()).is_ok());

        // Now the clause is unit and asserts its remaining literal.
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(2)));
        assert_eq!(ctx.part(ImplGraphP).reason(lit!(2).var()), &Reason::Long(cref));
        // The propagating literal was moved to position 0.
        assert_eq!(ctx.part(ClauseAllocP).clause(cref).lits()[0], lit!(2));
    }

    #[test]
    fn conflicts_are_reported_for_all_clause_kinds() {
        // Binary conflict
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 2);
        load_clause(ctx.borrow(), &lits![1, 2]);
        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::None);
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::None);
        match propagate(ctx.borrow()) {
            Err(Conflict::Binary(mut lits)) => {
                lits.sort();
                assert_eq!(lits, lits![1, 2]);
            }
            other => panic!("expected binary conflict, got {:?}", other),
        }

        // Ternary conflict
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 3);
        load_clause(ctx.borrow(), &lits![1, 2, 3]);
        for lit in lits![-1, -2, -3].iter() {
            enqueue_assignment(ctx.borrow(), *lit, Reason::None);
        }
        match propagate(ctx.borrow()) {
            Err(Conflict::Ternary(mut lits)) => {
                lits.sort();
                assert_eq!(lits, lits![1, 2, 3]);
            }
            other => panic!("expected ternary conflict, got {:?}", other),
        }

        // Long conflict
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 4);
        load_clause(ctx.borrow(), &lits![1, 2, 3, 4]);
        for lit in lits![-1, -2, -3, -4].iter() {
            enqueue_assignment(ctx.borrow(), *lit, Reason::None);
        }
        match propagate(ctx.borrow()) {
            Err(Conflict::Long(cref)) => {
                let mut conflict_lits = ctx.part(ClauseAllocP).clause(cref).lits().to_vec();
                conflict_lits.sort();
                assert_eq!(conflict_lits, lits![1, 2, 3, 4]);
            }
            other => panic!("expected long conflict, got {:?}", other),
        }
    }

    #[test]
    fn blocking_literal_skips_satisfied_clauses() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 6);

        let header = ClauseHeader::new();
        let lits = lits![1, 2, 3, 4];
        let cref = db::add_clause(ctx.borrow(), header, &lits);
        watch::attach_clause(ctx.borrow(), cref);

        // The blocking literal 3 is true, so propagating -1 must keep the watch in place without
        // touching the clause.
        enqueue_assignment(ctx.borrow(), lit!(3), Reason::None);
        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::None);
        assert!(propagate(ctx.borrow()).is_ok());

        assert!(ctx
            .part(WatchlistsP)
            .watches_clause(cref, [lit!(1), lit!(2)]));
        assert_eq!(ctx.part(ClauseAllocP).clause(cref).lits(), &lits[..]);
    }
}
