//! 工具层：按名注册的工具（专家框架选择器等）

pub mod registry;
pub mod selector;
pub mod tokenizer;

pub use registry::{Tool, ToolRegistry};
pub use selector::{FrameworkEntry, KeywordSelectorTool};
pub use tokenizer::KeywordMatcher;
