//! ExpressingAgent：基于子问题答案组织最终回答

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{Agent, AgentInfo};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::peer::{RequestContext, Stage, StageResult};

const EXPRESSING_PROMPT: &str = "你是一个擅长表达的助手。请结合背景知识，用清晰、有条理的语言完整回答用户的问题；背景知识不足时如实说明。";

pub struct ExpressingAgent {
    llm: Arc<dyn LlmClient>,
}

impl ExpressingAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 背景知识：执行结果按 `question:` / `answer:` 交替排列，以空行分隔
    pub fn build_background(ctx: &RequestContext) -> String {
        let Some(items) = ctx
            .result(Stage::Executing)
            .and_then(|r| r.get_data("executing_result"))
            .and_then(Value::as_array)
        else {
            return String::new();
        };

        let text = |v: Option<&Value>| match v {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let mut knowledge = Vec::with_capacity(items.len() * 2);
        for item in items {
            knowledge.push(format!("question:{}", text(item.get("input"))));
            knowledge.push(format!("answer:{}", text(item.get("output"))));
        }
        knowledge.join("\n\n")
    }
}

#[async_trait]
impl Agent for ExpressingAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new(Stage::Expressing.default_agent_name(), "组织最终回答")
    }

    async fn invoke(&self, ctx: &RequestContext) -> Result<StageResult, String> {
        let mut user = format!(
            "背景知识：\n{}\n\n问题：{}",
            Self::build_background(ctx),
            ctx.input()
        );
        if let Some(suggestion) = ctx
            .result(Stage::Reviewing)
            .and_then(|r| r.get_str("suggestion"))
            .filter(|s| !s.is_empty())
        {
            user.push_str(&format!("\n\n请根据评审意见改进回答：{}", suggestion));
        }

        let messages = vec![Message::system(EXPRESSING_PROMPT), Message::human(user)];
        let answer = self.llm.complete(&messages).await?;
        Ok(StageResult::new().with("output", answer.trim()))
    }
}
