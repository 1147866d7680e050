//! 子智能体：Agent 调用接口、按名注册表、默认 PEER 智能体
//!
//! 任何实现 Agent 的类型都可以注册到 AgentRegistry，再由 `[planner]` 配置按名引用。

pub mod default;
pub mod registry;

pub use default::{
    register_default_agents, ExecutingAgent, ExpressingAgent, PlanningAgent, ReviewingAgent,
};
pub use registry::AgentRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::peer::{RequestContext, StageResult};

/// 智能体的描述信息（随进度事件下发给前端）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
}

impl AgentInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// 可独立调用的子智能体
///
/// invoke 以当前完整上下文为输入，可被多次调用（每次上下文快照不同）。
#[async_trait]
pub trait Agent: Send + Sync {
    fn info(&self) -> AgentInfo;

    async fn invoke(&self, ctx: &RequestContext) -> Result<StageResult, String>;
}
