//! The calling side of the summarization contract.

pub mod http;
pub mod session;

pub use http::{SummaryClient, DEFAULT_SERVER_URL};
pub use session::{RequestTicket, SessionState, SummaryOutcome, SummarySession};
