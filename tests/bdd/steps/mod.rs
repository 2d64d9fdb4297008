//! Step definition modules for BDD scenarios.
//!
//! Steps are registered via macros, so the modules only need to be compiled
//! in; nothing is re-exported.

mod invocation;
