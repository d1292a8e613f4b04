//! dynscope: compile-time name resolution and run-time expando dispatch for a
//! dynamically flavored scripting language hosted on a static object model.
//!
//! The work is split across the workspace crates, re-exported here:
//!
//! - [`common`]: spans, diagnostics and limits
//! - [`resolver`]: scope chain, type catalog and the staged name resolver
//! - [`runtime`]: values, host classes, the side table and the dynamic dispatcher

pub use dynscope_common as common;
pub use dynscope_resolver as resolver;
pub use dynscope_runtime as runtime;

pub use dynscope_common::{Diagnostic, DiagnosticBag, Span};
pub use dynscope_resolver::{NameRequest, NameResolver, ResolvedReference, ResolverOptions};
pub use dynscope_runtime::{DispatchError, DynamicDispatcher, DynamicSideTable, LateBinder, Value};

// Tracing configuration (text / tree / JSON output)
pub mod tracing_config;

// JSON-driven command line front end
#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
#[path = "tests/facade_tests.rs"]
mod facade_tests;
