//! Event system for hearth
//!
//! A [`Topic`] is a named channel with a single shared payload slot and a
//! live subscriber list; its delivery loop task blocks on a notify flag
//! that [`Topic::fire`] pulses. The [`EventBus`] owns every topic's
//! backing store and the bus-wide closing signal.

mod bus;
mod connection;
mod topic;

pub use bus::EventBus;
pub use connection::Connection;
pub use topic::Topic;
