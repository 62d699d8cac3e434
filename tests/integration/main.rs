//! Integration tests for linked-page lookups
//!
//! These tests use wiremock to create mock HTTP servers and run lookups
//! end-to-end through the reqwest transport.

mod lookup_tests;
