pub mod completion;
pub mod request;
pub mod response;

pub use completion::*;
pub use request::*;
pub use response::*;
