//! End-to-end tests for the support bot live in `tests/`.
//!
//! They drive the HTTP router with `tower::ServiceExt::oneshot` over the
//! real classifier, router and session store, with in-memory
//! collaborators standing in for PostgreSQL.
