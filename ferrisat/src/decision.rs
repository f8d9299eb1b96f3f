//! Decision heuristics.
pub mod vsids;

use partial_ref::{partial, PartialRef};

use ferrisat_formula::{Lit, Var};

use crate::context::{AssignmentP, Context, ImplGraphP, TrailP, VsidsP};
use crate::prop::{enqueue_assignment, Reason};

/// Make a decision and enqueue it.
///
/// Pops the activity heap until an unassigned decision variable is found and assigns it to its
/// saved polarity.
///
/// Returns `false` if no decision was made because all decision variables are assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP
    ),
) -> bool {
    let (vsids, mut ctx) = ctx.split_part_mut(VsidsP);

    while let Some(var) = vsids.pop() {
        if !vsids.eligible(var) {
            continue;
        }
        let assignment = ctx.part(AssignmentP);
        if assignment.var_value(var).is_none() {
            let decision = Lit::from_var(var, assignment.last_var_value(var));

            ctx.part_mut(TrailP).new_decision_level();

            enqueue_assignment(ctx.borrow(), decision, Reason::None);

            return true;
        }
    }

    false
}

/// Insert a variable into the decision heap if not already present.
pub fn make_available(mut ctx: partial!(Context, mut VsidsP), var: Var) {
    ctx.part_mut(VsidsP).make_available(var);
}
