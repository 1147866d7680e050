//! Peer - PEER 多智能体规划循环（Plan / Execute / Express / Review）
//!
//! 模块划分：
//! - **agent**: Agent 调用接口、按名注册表、默认 LLM 智能体
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 对话消息与按 token 预算剪枝的对话记忆
//! - **observability**: tracing 初始化
//! - **peer**: 阶段、请求上下文、阶段包装器与 PEER 主循环
//! - **tools**: 工具注册表与专家框架选择器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod peer;
pub mod tools;

pub use agent::{Agent, AgentInfo, AgentRegistry};
pub use config::{AppConfig, PlannerConfig};
pub use core::PeerError;
pub use peer::{PeerOutput, PeerPlanner, RequestContext, RunOptions, Stage, StageResult};
