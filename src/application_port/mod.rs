mod http_client;
mod kost_service;

pub use http_client::*;
pub use kost_service::*;
