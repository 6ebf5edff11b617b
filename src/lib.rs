//! `rowset` treats each input file as a set of records and evaluates a set
//! expression over those sets. A record is one line, split into columns at
//! delimiter bytes; records are compared, and duplicates collapsed, by the
//! columns each part of the expression selects, so two lines that differ
//! can still count as the same record.
//!
//! The `args` module parses the command line and `expr` compiles its
//! expression; `operands` loads each input and `record` splits it into
//! column spans; `evaluate` then walks the expression tree, merging a pair
//! of sorted collections at each operator node with the key comparators
//! from `compare`.

#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]
#![deny(unused_must_use)]
#![deny(clippy::all)]
#![allow(clippy::needless_return)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]

pub mod args;
pub mod compare;
pub mod evaluate;
pub mod expr;
mod help;
pub mod mask;
pub mod operands;
pub mod record;
mod style;
