//! Configuration and Dependency Injection
//!
//! Wires the ports, stores and services of one engine instance.

mod container;

pub use container::Container;
