//! Integration tests for url-mux
//!
//! These tests start the multiplexer on an ephemeral port and point it at
//! wiremock servers standing in for the fetched sites.

mod helpers;
mod multiplex_tests;
