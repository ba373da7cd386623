mod faq;
mod registration;
mod request;
mod response;
mod room;
mod session;
mod tenant;

pub use faq::*;
pub use registration::*;
pub use request::*;
pub use response::*;
pub use room::*;
pub use session::*;
pub use tenant::*;
