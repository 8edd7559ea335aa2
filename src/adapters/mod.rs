//! Adapter implementations for port traits.
//!
//! - `live/`: real HTTP services and the tokio timer

pub mod live;
