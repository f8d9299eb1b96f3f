//! Watchlists to detect clauses that became unit.
//!
//! Each long clause has always two watches pointing to it. The watches are kept in the watchlists
//! of two different literals of the clause. Whenever the watches are moved to different literals
//! the literals of the clause are permuted so the watched literals are in position 0 and 1.
//!
//! When a clause is not unit under the current assignment, the watched literals point at two
//! non-false literals. When a clause is unit and thus propagating, the true literal is watched and
//! in position 0, the other watched literal is the one with the largest decision level and kept in
//! position 1. When a clause becomes satisfied before becoming unit the watches can be kept as
//! they were.
//!
//! When a literal is assigned false that invariant can be invalidated. This can be detected by
//! scanning the watches of the assigned literal. When the assignment is processed the watches are
//! moved to restore that invariant. Unless there is a conflict, i.e. a clause with no non-false
//! literals, this can always be done. This also finds all clauses that became unit. The new unit
//! clauses are exactly those clauses where no two non-false literals can be found.
//!
//! There is no need to update watchlists on backtracking, as unassigning variables cannot
//! invalidate the invariant.
//!
//! See [Section 4.5.1 of the "Handbook of Satisfiability"][handbook-ch4] for more details and
//! references.
//!
//! Each long watch stores a blocking literal of the clause different from the watched literal.
//! When that literal is true, the clause is already satisfied and the watch can be kept without
//! accessing the clause database at all. This variant was introduced by [Niklas Sörensson and
//! Niklas Eén in "MINISAT 2.1 and MINISAT++ 1.0 — SAT Race 2008 Editions"][minisat-2.1].
//!
//! Binary and ternary clauses are not stored in the clause arena at all. Instead their remaining
//! literals are inlined into the watch entries. These entries never move to other watchlists, so
//! short clauses propagate without touching the arena.
//!
//! [handbook-ch4]: https://www.satassociation.org/articles/FAIA185-0131.pdf
//! [minisat-2.1]: https://www.cril.univ-artois.fr/SAT09/solvers/booklet.pdf
use partial_ref::{partial, PartialRef};

use ferrisat_formula::Lit;

use crate::clause::{ClauseRef, Relocations};
use crate::context::{ClauseAllocP, Context, WatchlistsP};

/// A watch list entry.
#[derive(Copy, Clone)]
pub enum Watch {
    /// Inline binary clause, stores the single other literal.
    Binary { other: Lit, redundant: bool },
    /// Inline ternary clause, stores the two other literals.
    Ternary { others: [Lit; 2], redundant: bool },
    /// Long clause in the arena, stores a blocking literal of the clause.
    Long { cref: ClauseRef, blocking: Lit },
}

/// Watchlists to detect clauses that became unit.
///
/// The watches of a literal are kept in the list indexed by the code of its negation, so that
/// propagating an assigned literal walks exactly the watches that may have become unit or
/// conflicting.
#[derive(Default)]
pub struct Watchlists {
    /// Contains only valid data for indices of present variables.
    watches: Vec<Vec<Watch>>,
    binary_count: usize,
    ternary_count: usize,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Add an inline binary clause.
    pub fn add_binary(&mut self, lits: [Lit; 2], redundant: bool) {
        for i in 0..2 {
            self.watches[(!lits[i]).code()].push(Watch::Binary {
                other: lits[i ^ 1],
                redundant,
            });
        }
        self.binary_count += 1;
    }

    /// Add an inline ternary clause.
    pub fn add_ternary(&mut self, lits: [Lit; 3], redundant: bool) {
        for i in 0..3 {
            self.watches[(!lits[i]).code()].push(Watch::Ternary {
                others: [lits[(i + 1) % 3], lits[(i + 2) % 3]],
                redundant,
            });
        }
        self.ternary_count += 1;
    }

    /// Start watching a long clause.
    ///
    /// `lits` have to be the first two literals of the given clause, `blocking` one of the
    /// remaining ones.
    pub fn watch_clause(&mut self, cref: ClauseRef, lits: [Lit; 2], blocking: Lit) {
        for &lit in lits.iter() {
            self.watches[(!lit).code()].push(Watch::Long { cref, blocking });
        }
    }

    /// Stop watching a long clause.
    ///
    /// `lits` have to be the first two literals of the given clause.
    pub fn unwatch_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for &lit in lits.iter() {
            self.watches[(!lit).code()].retain(|watch| match watch {
                Watch::Long { cref: watched, .. } => *watched != cref,
                _ => true,
            });
        }
    }

    /// Make a literal watch a long clause.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch)
    }

    /// Take the watches that need to be revisited when the given literal was assigned true.
    ///
    /// Used by the propagation walk, which puts the kept entries back using
    /// [`restore`](Watchlists::restore).
    pub fn take(&mut self, lit: Lit) -> Vec<Watch> {
        std::mem::take(&mut self.watches[lit.code()])
    }

    /// Put a walked watchlist back.
    pub fn restore(&mut self, lit: Lit, watches: Vec<Watch>) {
        debug_assert!(self.watches[lit.code()].is_empty());
        self.watches[lit.code()] = watches;
    }

    /// Number of inline binary clauses.
    pub fn binary_count(&self) -> usize {
        self.binary_count
    }

    /// Number of inline ternary clauses.
    pub fn ternary_count(&self) -> usize {
        self.ternary_count
    }

    /// Whether both given literals carry a watch for the given clause.
    pub fn watches_clause(&self, cref: ClauseRef, lits: [Lit; 2]) -> bool {
        lits.iter().all(|&lit| {
            self.watches[(!lit).code()]
                .iter()
                .any(|watch| match watch {
                    Watch::Long { cref: watched, .. } => *watched == cref,
                    _ => false,
                })
        })
    }

    /// Rewrite all long clause references after a garbage collection.
    pub fn relocate(&mut self, relocations: &Relocations) {
        for watch_list in self.watches.iter_mut() {
            for watch in watch_list.iter_mut() {
                if let Watch::Long { cref, .. } = watch {
                    *cref = relocations.update(*cref);
                }
            }
        }
    }
}

/// Start watching a long clause with the watches required by propagation.
///
/// Reads the first two literals of the clause and picks the blocking literal from the rest.
pub fn attach_clause(mut ctx: partial!(Context, mut WatchlistsP, ClauseAllocP), cref: ClauseRef) {
    let (alloc, mut ctx) = ctx.split_part(ClauseAllocP);
    let lits = alloc.clause(cref).lits();
    ctx.part_mut(WatchlistsP)
        .watch_clause(cref, [lits[0], lits[1]], lits[2]);
}

/// Stop watching a long clause.
pub fn detach_clause(mut ctx: partial!(Context, mut WatchlistsP, ClauseAllocP), cref: ClauseRef) {
    let (alloc, mut ctx) = ctx.split_part(ClauseAllocP);
    let lits = alloc.clause(cref).lits();
    ctx.part_mut(WatchlistsP)
        .unwatch_clause(cref, [lits[0], lits[1]]);
}
