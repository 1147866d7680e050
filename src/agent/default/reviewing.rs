//! ReviewingAgent：给最终回答打分并提出修改意见
//!
//! 专家框架文本拼在评审指令之前。回复无法解析为 JSON 时整段作为 suggestion，不给分数。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{Agent, AgentInfo};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::peer::{RequestContext, Stage, StageResult};

use super::extract_json;

const REVIEWING_INSTRUCTION: &str = r#"你是一个严格的评审专家。请判断回答是否准确、完整地解决了用户的问题，给出 0-100 的分数（完全满意才给 100）与具体的修改意见。
只输出 JSON：{"suggestion": "修改意见", "score": 80, "is_useful": true}"#;

pub struct ReviewingAgent {
    llm: Arc<dyn LlmClient>,
}

impl ReviewingAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Agent for ReviewingAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new(Stage::Reviewing.default_agent_name(), "评审回答并打分")
    }

    async fn invoke(&self, ctx: &RequestContext) -> Result<StageResult, String> {
        let instruction = format!(
            "{}{}",
            ctx.expert_framework().unwrap_or_default(),
            REVIEWING_INSTRUCTION
        );
        let answer = ctx
            .result(Stage::Expressing)
            .map(StageResult::output_text)
            .unwrap_or_default();
        let messages = vec![
            Message::system(instruction),
            Message::human(format!("问题：{}\n回答：{}", ctx.input(), answer)),
        ];

        let reply = self.llm.complete(&messages).await?;
        let Some(Value::Object(parsed)) = extract_json(&reply) else {
            return Ok(StageResult::new().with("suggestion", reply.trim()));
        };

        let mut result = StageResult::new().with(
            "suggestion",
            parsed.get("suggestion").cloned().unwrap_or_default(),
        );
        for key in ["score", "is_useful"] {
            if let Some(v) = parsed.get(key) {
                result.insert(key, v.clone());
            }
        }
        Ok(result)
    }
}
