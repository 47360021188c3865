//! Side-effect-free stages of the interpreter: expansion, tokenizing, and
//! building the command model.

pub mod job;
pub mod parser;
pub mod variable_expansion;
