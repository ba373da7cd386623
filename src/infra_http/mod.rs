mod cookie_jar;
mod session_store_memory;
mod transport_fake;
mod transport_reqwest;

pub use cookie_jar::*;
pub use session_store_memory::*;
pub use transport_fake::*;
pub use transport_reqwest::*;
