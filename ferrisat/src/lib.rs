//! Ferrisat is a CDCL based SAT solver written in Rust.
//!
//! The solver core consists of a clause arena with compact 32-bit references, watch lists with
//! inline binary and ternary clauses, a watched-literal unit propagation engine, first-UIP
//! conflict analysis with recursive clause minimization, an activity ordered decision heap and a
//! search schedule with glue driven restarts and clause database reduction.
//!
//! Formula ingestion and printing live in the companion crates `ferrisat-formula` and
//! `ferrisat-dimacs`; the command line front end is `ferrisat-cli`.
pub mod config;
pub mod solver;

mod analyze;
mod assumptions;
mod cdcl;
mod clause;
mod context;
mod decision;
mod glue;
mod load;
mod prop;
mod schedule;
mod state;
mod tmp;

pub use ferrisat_dimacs as dimacs;
pub use ferrisat_formula::{cnf, lit, CnfFormula, Lit, Var};

pub use solver::{Interrupter, SolveResult, Solver};
