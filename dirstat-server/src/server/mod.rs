//! HTTP surface: one-directory listings and subtree statistics under a fixed root.

pub mod paths;
pub mod routes;

pub use routes::serve;
