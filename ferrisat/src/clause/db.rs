//! Database for long clauses.
use partial_ref::{partial, PartialRef};

use crate::context::{ClauseAllocP, ClauseDbP, Context, WatchlistsP};
use crate::prop::watch;

use ferrisat_formula::Lit;

use super::header::HEADER_LEN;
use super::{ClauseHeader, ClauseRef};

/// Database for long clauses.
///
/// Tracks all clauses stored in the arena. Deleted clauses stay in `clauses` until the next
/// garbage collection, so the header's deleted flag needs to be checked when iterating.
#[derive(Default)]
pub struct ClauseDb {
    /// May contain deleted clauses, see above
    pub(super) clauses: Vec<ClauseRef>,
    /// Number of live redundant (learnt) clauses.
    redundant_count: usize,
    /// Number of live irredundant clauses.
    irredundant_count: usize,
    /// Size of deleted but not collected clauses
    pub(super) garbage_size: usize,
    /// Source of telemetry identifiers for new clauses.
    next_clause_id: u32,
}

impl ClauseDb {
    /// The number of live redundant clauses.
    pub fn redundant_count(&self) -> usize {
        self.redundant_count
    }

    /// The number of live irredundant clauses.
    pub fn irredundant_count(&self) -> usize {
        self.irredundant_count
    }
}

/// Add a long clause to the database.
///
/// Does not attach any watches, see [`watch::attach_clause`].
pub fn add_clause(
    mut ctx: partial!(Context, mut ClauseAllocP, mut ClauseDbP),
    mut header: ClauseHeader,
    lits: &[Lit],
) -> ClauseRef {
    let db = ctx.part_mut(ClauseDbP);

    header.set_id(db.next_clause_id);
    db.next_clause_id += 1;

    if header.redundant() {
        db.redundant_count += 1;
    } else {
        db.irredundant_count += 1;
    }

    let cref = ctx.part_mut(ClauseAllocP).add_clause(header, lits);

    ctx.part_mut(ClauseDbP).clauses.push(cref);

    cref
}

/// Delete a long clause from the database.
///
/// Detaches the clause's watches and marks the clause as deleted. The storage is reclaimed by the
/// next garbage collection.
pub fn delete_clause(
    mut ctx: partial!(Context, mut ClauseAllocP, mut ClauseDbP, mut WatchlistsP),
    cref: ClauseRef,
) {
    watch::detach_clause(ctx.borrow(), cref);

    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);
    let db = ctx.part_mut(ClauseDbP);

    let header = alloc.header_mut(cref);

    debug_assert!(!header.deleted(), "delete_clause for already deleted clause");

    header.set_deleted(true);

    if header.redundant() {
        db.redundant_count -= 1;
    } else {
        db.irredundant_count -= 1;
    }

    db.garbage_size += header.len() + HEADER_LEN;
}
