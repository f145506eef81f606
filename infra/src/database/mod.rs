//! Database infrastructure: connection pooling and MySQL repositories

pub mod connection;
pub mod mysql;
