//! Tower middleware integration.
//!
//! The client applies credential decoration internally; [`BearerAuth`] exposes
//! the same decoration as a composable [`tower::Layer`] for hosts that drive
//! `reqwest` through their own service stack.

pub use tower::{Layer, Service, ServiceBuilder};

mod bearer;

pub use bearer::{BearerAuth, BearerAuthService};
