//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - The bus frame counter (one increment per poll) is the only clock the core
//!   reasons about; liveness periods are expressed in ticks
//! - Wall-clock nanoseconds are only used for the connectivity probe

mod blueprint;
mod engine_config;
mod error;
mod message;
mod scene;
mod sink;
mod tick;
mod topic;
mod transport;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use message::*;
pub use scene::*;
pub use sink::*;
pub use tick::*;
pub use topic::Topic;
pub use transport::*;
