//! Chat domain — session state and response splitting.
//!
//! Pure, network-free logic: the conversation held in memory for the life of
//! the process, and the splitter that partitions a streamed response into
//! its reasoning block and final answer.

pub mod session;
pub mod splitter;

pub use session::{ChatSession, ConversationTurn};
pub use splitter::{split_response, SplitResponse};
