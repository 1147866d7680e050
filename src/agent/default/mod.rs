//! 默认 PEER 智能体：基于 LLM 的 Planning / Executing / Expressing / Reviewing
//!
//! 以 `Stage::default_agent_name()` 的名字注册，`[planner]` 不配置角色时即使用它们。

mod executing;
mod expressing;
mod planning;
mod reviewing;

use std::sync::Arc;

use serde_json::Value;

use crate::agent::AgentRegistry;
use crate::llm::LlmClient;

pub use executing::ExecutingAgent;
pub use expressing::ExpressingAgent;
pub use planning::PlanningAgent;
pub use reviewing::ReviewingAgent;

/// 用同一个 LLM 注册四个默认智能体
pub fn register_default_agents(registry: &mut AgentRegistry, llm: Arc<dyn LlmClient>) {
    registry.register(PlanningAgent::new(llm.clone()));
    registry.register(ExecutingAgent::new(llm.clone()));
    registry.register(ExpressingAgent::new(llm.clone()));
    registry.register(ReviewingAgent::new(llm));
}

/// 从 LLM 回复中取出 JSON 对象：```json 代码块优先，其次首个 `{` 到最后一个 `}`
pub(crate) fn extract_json(output: &str) -> Option<Value> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end < start {
            return None;
        }
        &trimmed[start..=end]
    };

    serde_json::from_str::<Value>(json_str)
        .ok()
        .filter(Value::is_object)
}
