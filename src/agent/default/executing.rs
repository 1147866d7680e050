//! ExecutingAgent：逐个回答规划出的子问题

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::{Agent, AgentInfo};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::peer::{RequestContext, Stage, StageResult};

const EXECUTING_PROMPT: &str =
    "你是一个严谨的助手。请简洁、准确地回答给定的子问题，只陈述事实与必要推理。";

pub struct ExecutingAgent {
    llm: Arc<dyn LlmClient>,
}

impl ExecutingAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 规划结果中的子问题；没有则把原始输入当作唯一子问题
    fn sub_questions(ctx: &RequestContext) -> Vec<String> {
        let questions: Vec<String> = ctx
            .result(Stage::Planning)
            .and_then(|r| r.get_data("framework"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if questions.is_empty() {
            vec![ctx.input().to_string()]
        } else {
            questions
        }
    }
}

#[async_trait]
impl Agent for ExecutingAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new(Stage::Executing.default_agent_name(), "逐个回答子问题")
    }

    async fn invoke(&self, ctx: &RequestContext) -> Result<StageResult, String> {
        let mut executing_result = Vec::new();
        for question in Self::sub_questions(ctx) {
            let messages = vec![
                Message::system(EXECUTING_PROMPT),
                Message::human(format!("原始问题：{}\n子问题：{}", ctx.input(), question)),
            ];
            let answer = self.llm.complete(&messages).await?;
            debug!(question = %question, "sub question answered");
            executing_result.push(json!({"input": question, "output": answer.trim()}));
        }
        Ok(StageResult::new().with("executing_result", Value::Array(executing_result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_answers_each_sub_question_in_order() {
        let llm = Arc::new(MockLlmClient::with_replies(["答案一", "答案二"]));
        let agent = ExecutingAgent::new(llm.clone());
        let mut ctx = RequestContext::new("q");
        ctx.set_result(
            Stage::Planning,
            StageResult::new().with("framework", json!(["问一", "问二"])),
        );

        let result = agent.invoke(&ctx).await.unwrap();
        assert_eq!(
            result.get_data("executing_result"),
            Some(&json!([
                {"input": "问一", "output": "答案一"},
                {"input": "问二", "output": "答案二"}
            ]))
        );
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_without_plan_answers_input() {
        let agent = ExecutingAgent::new(Arc::new(MockLlmClient::new()));
        let result = agent.invoke(&RequestContext::new("hi")).await.unwrap();
        let items = result.get_data("executing_result").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["input"], json!("hi"));
    }
}
