//! PlanningAgent：把问题拆成若干可独立回答的子问题

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::{Agent, AgentInfo};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::peer::{RequestContext, Stage, StageResult};

use super::extract_json;

const PLANNING_PROMPT: &str = r#"你是一个问题拆解专家。请把用户的问题拆解为 1-5 个可以独立回答的子问题，覆盖回答原问题所需的全部要点。
只输出 JSON：{"thought": "拆解思路", "framework": ["子问题1", "子问题2"]}"#;

pub struct PlanningAgent {
    llm: Arc<dyn LlmClient>,
}

impl PlanningAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_messages(ctx: &RequestContext) -> Vec<Message> {
        let mut system = String::new();
        if let Some(ef) = ctx.expert_framework() {
            system.push_str(ef);
            system.push_str("\n\n");
        }
        system.push_str(PLANNING_PROMPT);

        let mut user = format!("问题：{}", ctx.input());
        // 重新规划时带上上一轮评审意见
        if let Some(suggestion) = ctx
            .result(Stage::Reviewing)
            .and_then(|r| r.get_str("suggestion"))
            .filter(|s| !s.is_empty())
        {
            user.push_str(&format!("\n\n上一轮评审意见：{}", suggestion));
        }
        vec![Message::system(system), Message::human(user)]
    }
}

#[async_trait]
impl Agent for PlanningAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new(
            Stage::Planning.default_agent_name(),
            "将问题拆解为子问题框架",
        )
    }

    async fn invoke(&self, ctx: &RequestContext) -> Result<StageResult, String> {
        let reply = self.llm.complete(&Self::build_messages(ctx)).await?;
        let parsed = extract_json(&reply).unwrap_or(Value::Null);

        let framework: Vec<String> = parsed
            .get("framework")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let framework = if framework.is_empty() {
            vec![ctx.input().to_string()]
        } else {
            framework
        };
        let thought = parsed
            .get("thought")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(StageResult::new()
            .with("framework", json!(framework))
            .with("thought", thought))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_parses_framework() {
        let llm = Arc::new(MockLlmClient::with_replies([
            r#"{"thought": "分两步", "framework": ["什么是所有权", "什么是借用"]}"#,
        ]));
        let agent = PlanningAgent::new(llm);
        let result = agent.invoke(&RequestContext::new("讲讲 Rust")).await.unwrap();
        assert_eq!(
            result.get_data("framework"),
            Some(&json!(["什么是所有权", "什么是借用"]))
        );
        assert_eq!(result.get_str("thought"), Some("分两步"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back_to_input() {
        let llm = Arc::new(MockLlmClient::with_replies(["I cannot produce JSON"]));
        let agent = PlanningAgent::new(llm);
        let result = agent.invoke(&RequestContext::new("q")).await.unwrap();
        assert_eq!(result.get_data("framework"), Some(&json!(["q"])));
    }

    #[tokio::test]
    async fn test_prompt_carries_expert_framework_and_review() {
        let llm = Arc::new(MockLlmClient::with_replies([r#"{"framework": ["a"]}"#]));
        let agent = PlanningAgent::new(llm.clone());
        let mut ctx = RequestContext::new("q");
        ctx.set_expert_framework("先看宏观再看微观");
        ctx.set_result(
            Stage::Reviewing,
            StageResult::new().with("suggestion", "补充数据"),
        );
        agent.invoke(&ctx).await.unwrap();

        let call = &llm.calls()[0];
        assert!(call[0].content.starts_with("先看宏观再看微观"));
        assert!(call[1].content.contains("补充数据"));
    }
}
