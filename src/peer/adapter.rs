//! 阶段包装器：统一的子智能体调用约定
//!
//! 每个阶段：有智能体则以当前上下文调用（错误直接上抛，不在此层重试）；
//! 没有智能体则给出该阶段的默认结果并记 warning。随后写入对应结果槽、记录日志、推送进度事件。
//! 每次调用都与取消令牌竞争，取消不改变阶段顺序。

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::{Agent, AgentInfo};
use crate::core::PeerError;
use crate::peer::{ProgressEmitter, RequestContext, Stage, StageResult};

/// 一次运行内共享的阶段调用器
pub(crate) struct StageRunner<'a> {
    pub agent_info: &'a AgentInfo,
    pub emitter: &'a ProgressEmitter,
    pub cancel_token: &'a CancellationToken,
}

impl StageRunner<'_> {
    async fn invoke(
        &self,
        stage: Stage,
        agent: &Arc<dyn Agent>,
        ctx: &RequestContext,
    ) -> Result<StageResult, PeerError> {
        if self.cancel_token.is_cancelled() {
            return Err(PeerError::Cancelled { stage });
        }
        info!(%stage, agent = %agent.info().name, "Starting {stage} agent");
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(PeerError::Cancelled { stage }),
            result = agent.invoke(ctx) => {
                result.map_err(|reason| PeerError::SubAgent { stage, reason })
            }
        }
    }

    fn agent_info_value(&self) -> Value {
        serde_json::to_value(self.agent_info).unwrap_or(Value::Null)
    }

    pub async fn planning(
        &self,
        agent: Option<&Arc<dyn Agent>>,
        ctx: &mut RequestContext,
    ) -> Result<StageResult, PeerError> {
        let result = match agent {
            Some(agent) => self.invoke(Stage::Planning, agent, ctx).await?,
            None => {
                warn!("no planning agent.");
                StageResult::new().with("framework", json!([ctx.input()]))
            }
        };
        ctx.set_result(Stage::Planning, result.clone());

        let framework: Vec<String> = result
            .get_data("framework")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::String(s) => format!("[{}] {}", i + 1, s),
                        other => format!("[{}] {}", i + 1, other),
                    })
                    .collect()
            })
            .unwrap_or_default();
        info!(framework = %framework.join("\n"), "Planning agent execution result");

        self.emitter.emit(
            Stage::Planning,
            json!({"output": result.to_dict(), "agent_info": self.agent_info_value()}),
        );
        Ok(result)
    }

    pub async fn executing(
        &self,
        agent: Option<&Arc<dyn Agent>>,
        ctx: &mut RequestContext,
    ) -> Result<StageResult, PeerError> {
        let result = match agent {
            Some(agent) => self.invoke(Stage::Executing, agent, ctx).await?,
            None => {
                warn!("no executing agent.");
                StageResult::new()
            }
        };
        ctx.set_result(Stage::Executing, result.clone());

        if let Some(items) = result.get_data("executing_result").and_then(Value::as_array) {
            for (i, item) in items.iter().enumerate() {
                let input = item.get("input").unwrap_or(&Value::Null);
                let output = item.get("output").unwrap_or(&Value::Null);
                info!(
                    index = i + 1,
                    %input,
                    %output,
                    "Executing agent execution result"
                );
            }
        }

        self.emitter.emit(
            Stage::Executing,
            json!({"output": result.to_dict(), "agent_info": self.agent_info_value()}),
        );
        Ok(result)
    }

    pub async fn expressing(
        &self,
        agent: Option<&Arc<dyn Agent>>,
        ctx: &mut RequestContext,
    ) -> Result<StageResult, PeerError> {
        let result = match agent {
            Some(agent) => self.invoke(Stage::Expressing, agent, ctx).await?,
            None => {
                warn!("no expressing agent.");
                StageResult::new()
            }
        };
        ctx.set_result(Stage::Expressing, result.clone());

        info!(output = %result.output_text(), "Expressing agent execution result");

        self.emitter.emit(
            Stage::Expressing,
            json!({
                "output": result.output().cloned().unwrap_or(Value::Null),
                "agent_info": self.agent_info_value(),
            }),
        );
        Ok(result)
    }

    /// 评审阶段没有默认结果：缺少评审智能体由控制器直接终止循环
    pub async fn reviewing(
        &self,
        agent: &Arc<dyn Agent>,
        ctx: &mut RequestContext,
        eval_threshold: f64,
    ) -> Result<StageResult, PeerError> {
        let result = self.invoke(Stage::Reviewing, agent, ctx).await?;
        ctx.set_result(Stage::Reviewing, result.clone());

        let score = result.score();
        info!(
            suggestion = result.get_str("suggestion").unwrap_or_default(),
            score = ?score,
            eval_threshold,
            below_threshold = score.map(|s| s < eval_threshold).unwrap_or(true),
            "Reviewing agent execution result"
        );

        self.emitter.emit(Stage::Reviewing, result.to_dict());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct Fixed(Result<StageResult, String>);

    #[async_trait]
    impl Agent for Fixed {
        fn info(&self) -> AgentInfo {
            AgentInfo::new("Fixed", "")
        }

        async fn invoke(&self, _ctx: &RequestContext) -> Result<StageResult, String> {
            self.0.clone()
        }
    }

    struct Hang;

    #[async_trait]
    impl Agent for Hang {
        fn info(&self) -> AgentInfo {
            AgentInfo::new("Hang", "")
        }

        async fn invoke(&self, _ctx: &RequestContext) -> Result<StageResult, String> {
            std::future::pending().await
        }
    }

    fn fixture() -> (AgentInfo, ProgressEmitter, mpsc::UnboundedReceiver<crate::peer::PeerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AgentInfo::new("peer", "test"), ProgressEmitter::new(Some(tx)), rx)
    }

    #[tokio::test]
    async fn test_planning_default_wraps_input() {
        let (info, emitter, mut rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let mut ctx = RequestContext::new("what is rust");

        let result = runner.planning(None, &mut ctx).await.unwrap();
        assert_eq!(result.get_data("framework"), Some(&json!(["what is rust"])));
        assert_eq!(ctx.result(Stage::Planning), Some(&result));

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.stage, Stage::Planning);
        assert_eq!(ev.data["output"]["framework"], json!(["what is rust"]));
        assert_eq!(ev.data["agent_info"]["name"], json!("peer"));
    }

    #[tokio::test]
    async fn test_executing_and_expressing_defaults_are_empty() {
        let (info, emitter, mut rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let mut ctx = RequestContext::new("q");

        assert!(runner.executing(None, &mut ctx).await.unwrap().is_empty());
        assert!(runner.expressing(None, &mut ctx).await.unwrap().is_empty());
        assert_eq!(rx.try_recv().unwrap().stage, Stage::Executing);
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.stage, Stage::Expressing);
        assert_eq!(ev.data["output"], Value::Null);
    }

    #[tokio::test]
    async fn test_executing_result_items_are_logged_and_emitted() {
        let (info, emitter, mut rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let items = json!([{"input": "问一", "output": "答一"}, {"input": "问二"}]);
        let agent: Arc<dyn Agent> =
            Arc::new(Fixed(Ok(StageResult::new().with("executing_result", items.clone()))));
        let mut ctx = RequestContext::new("q");

        let result = runner.executing(Some(&agent), &mut ctx).await.unwrap();
        assert_eq!(result.get_data("executing_result"), Some(&items));
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.data["output"]["executing_result"], items);
    }

    #[tokio::test]
    async fn test_agent_error_carries_stage_and_leaves_slot_untouched() {
        let (info, emitter, mut rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let agent: Arc<dyn Agent> = Arc::new(Fixed(Err("llm down".into())));
        let mut ctx = RequestContext::new("q");

        let err = runner.executing(Some(&agent), &mut ctx).await.unwrap_err();
        assert!(matches!(err, PeerError::SubAgent { stage: Stage::Executing, .. }));
        assert!(ctx.result(Stage::Executing).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reviewing_emits_full_result() {
        let (info, emitter, mut rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let review = StageResult::new().with("suggestion", "ok").with("score", 90);
        let agent: Arc<dyn Agent> = Arc::new(Fixed(Ok(review.clone())));
        let mut ctx = RequestContext::new("q");

        runner.reviewing(&agent, &mut ctx, 60.0).await.unwrap();
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.data, review.to_dict());
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_hanging_agent() {
        let (info, emitter, _rx) = fixture();
        let token = CancellationToken::new();
        let runner = StageRunner { agent_info: &info, emitter: &emitter, cancel_token: &token };
        let agent: Arc<dyn Agent> = Arc::new(Hang);
        let mut ctx = RequestContext::new("q");

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = runner.planning(Some(&agent), &mut ctx).await.unwrap_err();
        assert!(matches!(err, PeerError::Cancelled { stage: Stage::Planning }));
    }
}
