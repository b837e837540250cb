//! Purpose: Typed synchronous client library for the Affinity CRM REST API.
//! Exports: `api` (client, entities, pagination, transport) and `core` (errors).
//! Role: Library backing the `affinity` CLI and downstream callers.
//! Invariants: Every operation is one blocking GET; errors surface to the
//! caller undecorated and nothing is retried or cached.
pub mod api;
pub mod core;
