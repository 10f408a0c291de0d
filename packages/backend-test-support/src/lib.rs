//! Test utilities shared by the matchroom unit and integration tests.
//!
//! Kept free of any dependency on the server crate so it can be used from
//! its integration tests without a cycle.

pub mod logging;
pub mod problem_details;

pub use problem_details::{assert_problem_details, ProblemDetailsLike};
