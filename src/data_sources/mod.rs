//! Data source handlers.

pub mod cluster_type;
