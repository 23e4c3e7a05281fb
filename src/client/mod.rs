//! Client facade: the decorate → send → recover → replay pipeline.

mod auth_client;
mod builder;

pub use auth_client::AuthClient;
pub use builder::AuthClientBuilder;
