//! Marketplace core for trading renewable-energy capacity.
//!
//! The crate is organised hexagonally: [`domain`] holds the entities,
//! state machines, and services; [`outbound`] holds the PostgreSQL
//! adapters implementing the domain's repository ports; [`config`] reads
//! the environment.

pub mod config;
pub mod domain;
pub mod outbound;
