//! Core infrastructure shared across the gateway's component crates.
//!
//! This crate provides:
//! - The event system used for observability (state transitions, rejections, flips)
//! - `Target`/`TargetKey`: the shared identity type for backend endpoints, used by
//!   the circuit breaker, health checker, and load balancer registries alike

pub mod events;
pub mod target;

pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use target::{Scheme, Target, TargetKey};
