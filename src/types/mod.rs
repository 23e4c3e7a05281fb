//! Type definitions: token newtypes, request descriptors, transport responses.

mod request;
mod response;
mod tokens;

pub use request::RequestDescriptor;
pub use response::Response;
pub use tokens::{AccessToken, RefreshToken};
