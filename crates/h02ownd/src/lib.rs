//! h02ownd - H02 GPS tracker to Owntracks MQTT gateway
//!
//! Accepts TCP connections from H02 trackers, splits the stream into
//! `#`-terminated frames and feeds each one through the
//! [`Gateway`](h02own_core::Gateway).

pub mod config;
pub mod frame;
pub mod listener;
pub mod logging;
