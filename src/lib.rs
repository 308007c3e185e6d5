//! Purpose: Library crate behind the `ipsetctl` CLI: a typed front end to ipset(8).
//! Exports: `core` (command model, argument compiler, parsers), `api` (client and set handles).
//! Role: Compile typed set operations into tool invocations and parse what comes back.
//! Invariants: All kernel interaction goes through the external `ipset` executable.
//! Invariants: Core modules are pure; process spawning lives behind `api::Executor`.
pub mod api;
pub mod core;
