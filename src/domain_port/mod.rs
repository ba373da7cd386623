mod session_store;
mod transport;

pub use session_store::*;
pub use transport::*;
