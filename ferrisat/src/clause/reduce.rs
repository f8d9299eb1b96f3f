//! Clause database reduction.
use log::debug;

use ordered_float::OrderedFloat;
use partial_ref::{partial, PartialRef};

use crate::context::{
    AssignmentP, ClauseAllocP, ClauseDbP, Context, ImplGraphP, TrailP, WatchlistsP,
};
use crate::prop::Reason;

use super::{db, ClauseRef};

/// Whether a clause is the reason of a current assignment and thus must not be deleted.
fn is_locked(
    ctx: partial!(Context, AssignmentP, ClauseAllocP, ImplGraphP),
    cref: ClauseRef,
) -> bool {
    let asserted_lit = ctx.part(ClauseAllocP).clause(cref).lits()[0];

    ctx.part(AssignmentP).lit_is_true(asserted_lit)
        && ctx.part(ImplGraphP).reason(asserted_lit.var()) == &Reason::Long(cref)
}

/// Reduce the number of learnt long clauses by deleting the worse half.
///
/// Clauses are ranked by glue level and ties broken by activity. Clauses that are the reason of a
/// current assignment are kept.
pub fn reduce_learnts(
    mut ctx: partial!(
        Context,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut WatchlistsP,
        AssignmentP,
        ImplGraphP,
        TrailP,
    ),
) {
    let candidates = ctx.part(ClauseDbP).clauses.clone();

    let mut learnts: Vec<ClauseRef> = vec![];
    for &cref in candidates.iter() {
        {
            let header = ctx.part(ClauseAllocP).header(cref);
            if !header.redundant() || header.deleted() {
                continue;
            }
        }
        if !is_locked(ctx.borrow(), cref) {
            learnts.push(cref);
        }
    }

    learnts.sort_unstable_by_key(|&cref| {
        let header = ctx.part(ClauseAllocP).header(cref);
        (header.glue(), OrderedFloat(-header.activity()))
    });

    let keep = learnts.len() / 2;

    for &cref in &learnts[keep..] {
        {
            let header = ctx.part(ClauseAllocP).header(cref);
            debug!(
                "reduce: deleting clause {} (glue {})",
                header.id(),
                header.glue()
            );
        }
        db::delete_clause(ctx.borrow(), cref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use ferrisat_formula::{cnf_formula, lit};

    use crate::clause::ClauseHeader;
    use crate::context::set_var_count;
    use crate::prop::{enqueue_assignment, watch};

    #[test]
    fn reduction_keeps_good_and_locked_clauses() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let clauses = cnf_formula![
            1, 2, 3, 4;
            2, 3, 4, 5;
            3, 4, 5, 6;
            4, 5, 6, 7;
        ];

        set_var_count(ctx.borrow(), clauses.var_count());

        let glues = [2, 7, 8, 9];

        let mut crefs = vec![];
        for (lits, &glue) in clauses.iter().zip(glues.iter()) {
            let mut header = ClauseHeader::new();
            header.set_redundant(true);
            header.set_glue(glue);
            let cref = db::add_clause(ctx.borrow(), header, lits);
            watch::attach_clause(ctx.borrow(), cref);
            crefs.push(cref);
        }

        // The worst clause is locked as a reason and must survive.
        enqueue_assignment(ctx.borrow(), lit!(4), Reason::Long(crefs[3]));

        reduce_learnts(ctx.borrow());

        let deleted: Vec<bool> = crefs
            .iter()
            .map(|&cref| ctx.part(ClauseAllocP).header(cref).deleted())
            .collect();

        // Of the three deletable clauses the two with the highest glue are removed.
        assert_eq!(deleted, vec![false, true, true, false]);

        // Deleted clauses are no longer watched.
        for (&cref, lits) in crefs.iter().zip(clauses.iter()) {
            let watched = ctx
                .part(WatchlistsP)
                .watches_clause(cref, [lits[0], lits[1]]);
            assert_eq!(watched, !ctx.part(ClauseAllocP).header(cref).deleted());
        }
    }
}
