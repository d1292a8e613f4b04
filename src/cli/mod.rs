//! Native CLI support for the dynscope binary.

pub mod args;
pub mod program;
pub mod reporter;
pub mod script;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/program_tests.rs"]
mod program_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod script_tests;
