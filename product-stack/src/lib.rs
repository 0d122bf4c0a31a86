//! Declarative composition of the product catalog GraphQL API: identity
//! provider, product table, compute handler, API and their wiring, plus a
//! template synthesizer and a local provisioning engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod model;
pub mod schema;
pub mod stack;
pub mod synth;

pub use error::CompositionError;
pub use graph::{Composition, CompositionBuilder};
