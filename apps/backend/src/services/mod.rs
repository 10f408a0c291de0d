//! Application services that orchestrate the domain against store and gateway.

pub mod coordinator;
pub mod sweeper;

pub use coordinator::{JoinResult, MoveResult, SessionCoordinator, DEFAULT_MAX_RETRIES};
pub use sweeper::{spawn_sweeper, sweep_once};
