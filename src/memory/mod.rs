//! 记忆层：对话消息、Memory 协作者接口、带 token 预算的对话记忆

pub mod chat;
pub mod message;
pub mod token_budget;

pub use chat::{ChatMemory, Memory, MemoryQuery};
pub use message::{memory_string, Message, Role};
pub use token_budget::TokenEstimator;
