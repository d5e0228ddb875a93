//! Communication and graph algorithms.

pub mod communicator;
pub mod dual_graph;
pub mod exchange;
pub mod wire;

pub use communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
pub use exchange::{Exchanger, KeyedIds};
