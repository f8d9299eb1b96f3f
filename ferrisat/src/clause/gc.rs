//! Garbage collection of long clauses.
//!
//! Deleting a clause only flips a flag in its header. The storage is reclaimed here, by copying
//! all surviving clauses into a fresh allocator. Every copy is recorded in a relocation table and
//! all external holders of clause references (watch lists, reasons on the trail) are rewritten
//! through that table before the old allocator is dropped.
use partial_ref::{partial, PartialRef};

use rustc_hash::FxHashMap;

use crate::context::{ClauseAllocP, ClauseDbP, Context, ImplGraphP, TrailP, WatchlistsP};

use super::{ClauseAlloc, ClauseRef};

/// Old to new clause references of a garbage collection.
#[derive(Default)]
pub struct Relocations {
    map: FxHashMap<ClauseRef, ClauseRef>,
}

impl Relocations {
    /// Record the new reference of a surviving clause.
    fn insert(&mut self, old: ClauseRef, new: ClauseRef) {
        self.map.insert(old, new);
    }

    /// The new reference of a clause that survived the collection.
    ///
    /// Panics when called with a reference that was not relocated, i.e. a reference that was
    /// dangling before the collection.
    pub fn update(&self, cref: ClauseRef) -> ClauseRef {
        match self.map.get(&cref) {
            Some(&new) => new,
            None => panic!("dangling clause reference {:?}", cref),
        }
    }
}

/// Perform a garbage collection of long clauses if necessary.
pub fn collect_garbage(
    mut ctx: partial!(
        Context,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut WatchlistsP,
        TrailP,
    ),
) {
    let alloc = ctx.part(ClauseAllocP);
    let db = ctx.part(ClauseDbP);

    // Collecting when a fixed fraction of the allocation is garbage amortizes collection costs.
    if db.garbage_size * 2 > alloc.buffer_size() {
        collect_garbage_now(ctx.borrow());
    }
}

/// Unconditionally perform a garbage collection of long clauses.
pub fn collect_garbage_now(
    mut ctx: partial!(
        Context,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut WatchlistsP,
        TrailP,
    ),
) {
    let (db, mut ctx) = ctx.split_part_mut(ClauseDbP);

    let alloc = ctx.part(ClauseAllocP);

    assert!(
        db.garbage_size <= alloc.buffer_size(),
        "Inconsistent garbage tracking in ClauseDb"
    );
    let current_size = alloc.buffer_size() - db.garbage_size;

    // Allocating just the current size would lead to an immediate growing when new clauses are
    // learned, overallocating here avoids that.
    let mut new_alloc = ClauseAlloc::with_capacity(current_size * 2);

    let mut relocations = Relocations::default();
    let mut new_clauses = vec![];

    for &cref in db.clauses.iter() {
        let clause = alloc.clause(cref);
        if clause.header().deleted() {
            continue;
        }

        let new_cref = new_alloc.add_clause(clause.header().clone(), clause.lits());
        relocations.insert(cref, new_cref);
        new_clauses.push(new_cref);
    }

    *ctx.part_mut(ClauseAllocP) = new_alloc;
    db.clauses = new_clauses;
    db.garbage_size = 0;

    ctx.part_mut(WatchlistsP).relocate(&relocations);

    let (trail, mut ctx) = ctx.split_part(TrailP);
    ctx.part_mut(ImplGraphP)
        .relocate(trail.trail(), &relocations);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cmp::max;

    use partial_ref::IntoPartialRefMut;
    use proptest::*;

    use ferrisat_formula::{cnf::strategy::*, Lit};

    use crate::clause::{db, ClauseHeader};
    use crate::context::{set_var_count, AssignmentP};
    use crate::prop::{enqueue_assignment, watch, Reason};

    proptest! {
        #[test]
        fn garbage_collection_relocates_all_holders(
            input_a in cnf_formula(2..100usize, 500..1000, 4..30),
            input_b in cnf_formula(2..100usize, 10..500, 4..20),
        ) {
            let mut ctx = Context::default();
            let mut ctx = ctx.into_partial_ref_mut();

            set_var_count(ctx.borrow(), max(input_a.var_count(), input_b.var_count()));

            let mut crefs_a = vec![];
            let mut crefs_b = vec![];

            for lits in input_a.iter() {
                let header = ClauseHeader::new();
                let cref = db::add_clause(ctx.borrow(), header, lits);
                crefs_a.push(cref);
            }

            for lits in input_b.iter() {
                let header = ClauseHeader::new();
                let cref = db::add_clause(ctx.borrow(), header, lits);
                watch::attach_clause(ctx.borrow(), cref);
                crefs_b.push(cref);

                if ctx.part(AssignmentP).lit_value(lits[0]) == None {
                    // This isn't consistent, as the clause isn't actually propagating, but that
                    // isn't checked during garbage collection
                    enqueue_assignment(ctx.borrow(), lits[0], Reason::Long(cref));
                }
            }

            for cref in crefs_a {
                db::delete_clause(ctx.borrow(), cref);
                prop_assert!(ctx.part(ClauseDbP).garbage_size > 0);
            }

            let old_buffer_size = ctx.part(ClauseAllocP).buffer_size();

            collect_garbage(ctx.borrow());

            prop_assert!(
                ctx.part(ClauseDbP).garbage_size * 2 < ctx.part(ClauseAllocP).buffer_size()
            );

            prop_assert!(old_buffer_size > ctx.part(ClauseAllocP).buffer_size());

            let mut output_clauses: Vec<Vec<Lit>> = vec![];

            for &cref in ctx.part(ClauseDbP).clauses.iter() {
                let clause = ctx.part(ClauseAllocP).clause(cref);
                prop_assert!(!clause.header().deleted());
                output_clauses.push(clause.lits().iter().cloned().collect());
            }

            let mut input_clauses: Vec<Vec<Lit>> = input_b
                .iter()
                .map(|c| c.iter().cloned().collect())
                .collect();

            output_clauses.sort();
            input_clauses.sort();

            prop_assert_eq!(input_clauses, output_clauses);

            // Reasons on the trail still point at clauses with the propagated lit in front.
            for &lit in ctx.part(TrailP).trail() {
                if let &Reason::Long(cref) = ctx.part(ImplGraphP).reason(lit.var()) {
                    prop_assert_eq!(ctx.part(ClauseAllocP).clause(cref).lits()[0], lit)
                }
            }

            // Watches were rewritten to the surviving references.
            for &cref in ctx.part(ClauseDbP).clauses.iter() {
                let lits = ctx.part(ClauseAllocP).clause(cref).lits().to_vec();
                prop_assert!(ctx.part(WatchlistsP).watches_clause(cref, [lits[0], lits[1]]));
            }
        }
    }
}
