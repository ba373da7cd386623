mod authenticated_client;
mod kost_service_impl;
mod refresh_coordinator;

pub use authenticated_client::*;
pub use kost_service_impl::*;
pub use refresh_coordinator::*;
