//! Inbound and outbound adapters for the surrounding system.

pub mod csv;
