//! CNF formulas.
use std::borrow::Borrow;

use crate::lit::Lit;

/// A formula in conjunctive normal form: a conjunction of clauses, each an ordered sequence of
/// literals.
///
/// This is the hand-off type between formula ingestion and the solver. The solver copies every
/// clause into its own storage when loading, so this container keeps one literal vector per
/// clause and favors simplicity over cache density.
///
/// The variable count grows to cover every added literal and can be raised further for variables
/// no clause mentions, as a DIMACS header may announce.
#[derive(Default, PartialEq, Eq, Debug)]
pub struct CnfFormula {
    var_count: usize,
    clauses: Vec<Vec<Lit>>,
}

impl CnfFormula {
    /// Create an empty CNF formula.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Number of variables in the formula.
    ///
    /// One more than the largest variable index present, or more if
    /// [`set_var_count`](CnfFormula::set_var_count) announced a higher count.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Announce a variable count beyond what the clauses mention.
    ///
    /// Counts not above the current one are ignored; the count never shrinks.
    pub fn set_var_count(&mut self, count: usize) {
        if count > self.var_count {
            self.var_count = count;
        }
    }

    /// Number of clauses in the formula.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the formula contains no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append a clause, extending the variable count to cover its literals.
    ///
    /// Accepts any iterable of [`Lit`] values or references.
    pub fn add_clause<L: Borrow<Lit>>(&mut self, literals: impl IntoIterator<Item = L>) {
        let clause: Vec<Lit> = literals.into_iter().map(|lit| *lit.borrow()).collect();
        for lit in clause.iter() {
            if lit.index() >= self.var_count {
                self.var_count = lit.index() + 1;
            }
        }
        self.clauses.push(clause);
    }

    /// Iterate over the clauses as literal slices.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses.iter().map(Vec::as_slice)
    }
}

/// Collect any iterable of clauses into a formula.
impl<F, C> From<F> for CnfFormula
where
    F: IntoIterator<Item = C>,
    C: Borrow<[Lit]>,
{
    fn from(clauses: F) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(clause.borrow());
        }
        formula
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Formula over the given number of variables with random clauses of the given lengths.
    ///
    /// The variable count of the generated formula is always the drawn count, whether or not all
    /// variables appear in clauses.
    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // ind_flat_map so shrinking doesn't retry every variable count
        vars.prop_ind_flat_map(move |vars| {
            let clause = collection::vec(lit(0..vars), clause_len.clone());
            (Just(vars), collection::vec(clause, clauses.clone()))
        })
        .prop_map(|(vars, clauses)| {
            let mut formula = CnfFormula::from(clauses);
            formula.set_var_count(vars);
            formula
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{strategy::*, *};

    use proptest::*;

    #[test]
    fn macro_and_manual_construction_agree() {
        let mut manual = CnfFormula::new();
        assert!(manual.is_empty());

        manual.add_clause(&lits![1, 2, 3]);
        manual.add_clause(lits![-1, -2].iter());
        manual.add_clause(&lits![7, 2]);

        assert_eq!(
            manual,
            cnf_formula![
                1, 2, 3;
                -1, -2;
                7, 2;
            ]
        );
        assert_eq!(manual.len(), 3);
        assert_eq!(manual.var_count(), 7);

        let third = manual.iter().nth(2).unwrap();
        assert_eq!(third, &lits![7, 2][..]);
    }

    #[test]
    fn var_count_never_shrinks() {
        let mut formula = CnfFormula::new();
        formula.add_clause(&lits![4]);
        assert_eq!(formula.var_count(), 4);

        formula.set_var_count(2);
        assert_eq!(formula.var_count(), 4);

        formula.set_var_count(9);
        assert_eq!(formula.var_count(), 9);

        formula.add_clause(&lits![1]);
        assert_eq!(formula.var_count(), 9);
    }

    proptest! {
        #[test]
        fn rebuilding_from_the_clauses_roundtrips(input in cnf_formula(1..100usize, 0..500, 0..10)) {
            let mut rebuilt = CnfFormula::from(input.iter());

            for (clause, ref_clause) in rebuilt.iter().zip(input.iter()) {
                prop_assert_eq!(clause, ref_clause);
            }

            // Variables only announced by the count are not recovered from the clauses alone.
            prop_assert!(rebuilt.var_count() <= input.var_count());
            rebuilt.set_var_count(input.var_count());

            prop_assert_eq!(rebuilt, input);
        }
    }
}
