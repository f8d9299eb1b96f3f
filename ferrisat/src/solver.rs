//! Boolean satisfiability solver.
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use anyhow::Error;
use log::info;

use ferrisat_dimacs::DimacsParser;
use ferrisat_formula::{CnfFormula, Lit, Var};

use crate::assumptions::set_assumptions;
use crate::config::SolverConfig;
use crate::context::{
    config_changed, ensure_var_count, AssignmentP, Context, ScheduleP, SolverStateP, VsidsP,
};
use crate::load::load_clause;
use crate::schedule::schedule_step;
use crate::state::SatState;

/// Result of checking the satisfiability of a formula.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SolveResult {
    /// The formula is satisfiable, with the assigned literals of the found model.
    Sat(Vec<Lit>),
    /// The formula is unsatisfiable.
    ///
    /// When solving under assumptions this carries the subset of the assumptions that made the
    /// formula unsatisfiable; otherwise it is empty.
    Unsat(Vec<Lit>),
    /// The search was interrupted or ran out of its conflict budget.
    Unknown,
}

/// Handle to make a running solve call return early.
///
/// Can be cloned and moved to other threads.
#[derive(Clone)]
pub struct Interrupter {
    interrupt_requested: Arc<AtomicBool>,
}

impl Interrupter {
    /// Make the solver return with an unknown result at the next schedule step.
    pub fn interrupt(&self) {
        self.interrupt_requested.store(true, Ordering::Relaxed);
    }
}

/// A boolean satisfiability solver.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
}

impl Solver {
    /// Create a new solver.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        let mut solver = Solver::default();
        solver.ctx.solver_config = config;
        {
            let mut ctx = solver.ctx.into_partial_ref_mut();
            config_changed(ctx.borrow());
        }
        solver
    }

    /// Add a new variable.
    ///
    /// Variables not eligible for branching are never picked as decisions, but may still be
    /// assigned by propagation.
    pub fn new_var(&mut self, decision_eligible: bool) -> Var {
        let mut ctx = self.ctx.into_partial_ref_mut();
        let var = Var::from_index(ctx.part(AssignmentP).assignment().len());
        ensure_var_count(ctx.borrow(), var.index() + 1);
        ctx.part_mut(VsidsP).set_eligible(var, decision_eligible);
        var
    }

    /// Add a clause to the formula.
    ///
    /// Returns `false` when the clause is trivially falsified under the level 0 assignment,
    /// making the formula unsatisfiable.
    pub fn add_clause(&mut self, clause: &[Lit]) -> bool {
        let mut ctx = self.ctx.into_partial_ref_mut();

        let var_count = clause
            .iter()
            .map(|lit| lit.index() + 1)
            .max()
            .unwrap_or(0);
        ensure_var_count(ctx.borrow(), var_count);

        load_clause(ctx.borrow(), clause);

        ctx.part(SolverStateP).sat_state != SatState::Unsat
    }

    /// Add a formula to the solver.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }
    }

    /// Reads and adds a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = DimacsParser::parse(input)?;

        info!(
            "Parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );

        self.add_formula(&formula);

        Ok(())
    }

    /// Set the assumptions for the following solve calls.
    ///
    /// The assumptions are forced true, in order, before free branching begins. An empty slice
    /// clears the assumptions.
    pub fn assume(&mut self, assumptions: &[Lit]) {
        let mut ctx = self.ctx.into_partial_ref_mut();

        let var_count = assumptions
            .iter()
            .map(|lit| lit.index() + 1)
            .max()
            .unwrap_or(0);
        ensure_var_count(ctx.borrow(), var_count);

        set_assumptions(ctx.borrow(), assumptions);
    }

    /// Check the satisfiability of the current formula under the current assumptions.
    pub fn solve(&mut self) -> SolveResult {
        self.solve_inner(None)
    }

    /// Like [`solve`](Solver::solve), but gives up after the given number of conflicts.
    pub fn solve_limited(&mut self, conflict_budget: u64) -> SolveResult {
        self.solve_inner(Some(conflict_budget))
    }

    fn solve_inner(&mut self, conflict_budget: Option<u64>) -> SolveResult {
        let sat_state = {
            let mut ctx = self.ctx.into_partial_ref_mut();

            ctx.part_mut(ScheduleP).set_conflict_budget(conflict_budget);

            while schedule_step(ctx.borrow()) {}

            ctx.part(SolverStateP).sat_state
        };

        match sat_state {
            SatState::Unknown => SolveResult::Unknown,
            SatState::Sat => SolveResult::Sat(self.model().unwrap()),
            SatState::Unsat => SolveResult::Unsat(vec![]),
            SatState::UnsatUnderAssumptions => {
                SolveResult::Unsat(self.failed_core().unwrap().to_vec())
            }
        }
    }

    /// Set of literals that satisfy the formula.
    ///
    /// Only available when the last solve call found the formula satisfiable.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let mut ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).sat_state == SatState::Sat {
            Some(
                ctx.part(AssignmentP)
                    .assignment()
                    .iter()
                    .enumerate()
                    .flat_map(|(index, assignment)| {
                        assignment.map(|value| Lit::from_index(index, value))
                    })
                    .collect(),
            )
        } else {
            None
        }
    }

    /// Subset of the assumptions that made the formula unsatisfiable.
    ///
    /// Only available when the last solve call found the formula unsatisfiable under the given
    /// assumptions.
    pub fn failed_core(&self) -> Option<&[Lit]> {
        if self.ctx.solver_state.sat_state == SatState::UnsatUnderAssumptions {
            Some(self.ctx.assumptions.failed_core())
        } else {
            None
        }
    }

    /// Value of a literal under the current assignment.
    ///
    /// Between solve calls this is the level 0 assignment.
    pub fn value(&self, lit: Lit) -> Option<bool> {
        let mut ctx = self.ctx.into_partial_ref();
        ctx.part(AssignmentP).lit_value(lit)
    }

    /// Read-only view of the current assignment, indexed by variable.
    ///
    /// Between solve calls this is the level 0 assignment.
    pub fn assignment(&self) -> &[Option<bool>] {
        self.ctx.assignment.assignment()
    }

    /// Make the solver return with an unknown result at the next schedule step.
    pub fn interrupt(&self) {
        self.ctx
            .solver_state
            .interrupt_requested
            .store(true, Ordering::Relaxed);
    }

    /// Handle that can interrupt this solver from other threads.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            interrupt_requested: self.ctx.solver_state.interrupt_requested.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{prelude::*, test_runner::TestCaseError};

    use ferrisat_formula::test::{conditional_pigeon_hole, sat_formula, sgen_unsat_formula};
    use ferrisat_formula::{cnf_formula, lits};

    use ferrisat_dimacs::write_dimacs;

    #[test]
    fn simple_unsat_under_assumptions() {
        let mut solver = Solver::new();

        solver.add_formula(&cnf_formula![
            1, 2;
            -1, 2;
        ]);

        assert!(matches!(solver.solve(), SolveResult::Sat(_)));

        solver.assume(&lits![-2]);

        match solver.solve() {
            SolveResult::Unsat(core) => assert_eq!(core, lits![-2]),
            other => panic!("expected unsat, got {:?}", other),
        }

        // Clearing the assumptions makes the formula satisfiable again.
        solver.assume(&[]);
        assert!(matches!(solver.solve(), SolveResult::Sat(_)));
    }

    #[test]
    fn interrupt_is_consumed() {
        let mut solver = Solver::new();
        solver.add_formula(&cnf_formula![1, 2; -1, 2;]);

        solver.interrupter().interrupt();
        assert_eq!(solver.solve(), SolveResult::Unknown);

        // The flag was consumed, solving proceeds normally now.
        assert!(matches!(solver.solve(), SolveResult::Sat(_)));
    }

    #[test]
    fn ineligible_vars_are_not_decided() {
        let mut solver = Solver::new();

        let a = solver.new_var(true);
        let b = solver.new_var(false);

        solver.add_clause(&[a.positive()]);

        match solver.solve() {
            SolveResult::Sat(model) => {
                // The unconstrained ineligible variable is never branched on and stays
                // unassigned.
                assert!(model.contains(&a.positive()));
                assert!(!model.iter().any(|lit| lit.var() == b));
                assert_eq!(solver.value(b.positive()), None);
            }
            other => panic!("expected sat, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..7usize)) {
            let mut solver = Solver::new();

            solver.add_formula(&formula);

            prop_assert_eq!(solver.solve(), SolveResult::Unsat(vec![]));
        }

        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut solver = Solver::new();

            solver.add_formula(&formula);

            let model = match solver.solve() {
                SolveResult::Sat(model) => model,
                other => return Err(TestCaseError::fail(format!("expected sat, got {:?}", other))),
            };

            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|lit| model.contains(lit)));
            }
        }

        #[test]
        fn sat_via_dimacs(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut solver = Solver::new();

            let mut dimacs = vec![];

            write_dimacs(&mut dimacs, &formula).unwrap();

            solver.add_dimacs_cnf(&mut &dimacs[..]).unwrap();

            let model = match solver.solve() {
                SolveResult::Sat(model) => model,
                other => return Err(TestCaseError::fail(format!("expected sat, got {:?}", other))),
            };

            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|lit| model.contains(lit)));
            }
        }

        #[test]
        fn pigeon_hole_unsat_assumption_core(
            (enable_row, columns, formula) in conditional_pigeon_hole(1..5usize, 1..5usize),
        ) {
            let mut solver = Solver::new();
            solver.add_formula(&formula);

            prop_assert!(matches!(solver.solve(), SolveResult::Sat(_)));

            solver.assume(&enable_row);

            let mut candidates = match solver.solve() {
                SolveResult::Unsat(core) => core,
                other => return Err(TestCaseError::fail(format!("expected unsat, got {:?}", other))),
            };
            prop_assert!(!candidates.is_empty());

            let mut core: Vec<Lit> = vec![];

            loop {
                solver.assume(&candidates[0..candidates.len() - 1]);

                match solver.solve() {
                    SolveResult::Unknown => unreachable!(),
                    SolveResult::Unsat(new_core) => {
                        if new_core.is_empty() {
                            break;
                        }
                        candidates = new_core;
                    }
                    SolveResult::Sat(_) => {
                        let skipped = *candidates.last().unwrap();
                        core.push(skipped);
                        solver.add_clause(&[skipped]);
                    }
                }
            }

            prop_assert_eq!(core.len(), columns + 1);
        }
    }
}
