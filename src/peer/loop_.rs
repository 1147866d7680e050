//! PEER 主循环
//!
//! Planning -> Executing -> Expressing -> Reviewing，最多 retry_count 轮；
//! 第二轮起按 jump_step 冻结靠前阶段的结果。评审分数达到 ACCEPTANCE_SCORE 提前结束，
//! 没有评审智能体时只跑一轮。无论在哪一处终止，都把最终回答写入对话记忆（至多一次）。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::agent::{AgentInfo, AgentRegistry};
use crate::config::PlannerConfig;
use crate::core::PeerError;
use crate::memory::Memory;
use crate::peer::adapter::StageRunner;
use crate::peer::recorder::record_exchange;
use crate::peer::{
    inject_expert_framework, resolve_sub_agents, IterationRecord, PeerEvent, PeerOutput,
    ProgressEmitter, RequestContext, Stage,
};
use crate::tools::ToolRegistry;

/// 评审通过的分数下限（与 planner.eval_threshold 无关，后者只用于日志）
pub const ACCEPTANCE_SCORE: f64 = 100.0;

/// 单次运行的可选项：进度事件通道与取消令牌
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub event_tx: Option<UnboundedSender<PeerEvent>>,
    pub cancel_token: CancellationToken,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_tx(mut self, tx: UnboundedSender<PeerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }
}

/// PEER 规划器：持有智能体注册表与可选的工具、记忆协作者
pub struct PeerPlanner {
    agents: AgentRegistry,
    tools: Option<Arc<ToolRegistry>>,
    memory: Option<Arc<dyn Memory>>,
    info: AgentInfo,
}

impl PeerPlanner {
    pub fn new(agents: AgentRegistry) -> Self {
        Self {
            agents,
            tools: None,
            memory: None,
            info: AgentInfo::new("peer", ""),
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// 随进度事件下发的自身描述
    pub fn with_info(mut self, info: AgentInfo) -> Self {
        self.info = info;
        self
    }

    pub fn info(&self) -> &AgentInfo {
        &self.info
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn memory(&self) -> Option<&Arc<dyn Memory>> {
        self.memory.as_ref()
    }

    /// 以纯文本输入跑一次，不推送事件、不可取消
    pub async fn invoke(
        &self,
        config: &PlannerConfig,
        input: impl Into<String>,
    ) -> Result<PeerOutput, PeerError> {
        let mut ctx = RequestContext::new(input);
        self.run(config, &mut ctx, RunOptions::default()).await
    }

    /// 执行 PEER 循环
    ///
    /// 开始前清空上下文中的阶段结果与专家框架，只保留原始请求字段。
    /// 配置错误在任何阶段运行前返回；子智能体失败或取消会中止运行，不返回部分结果。
    pub async fn run(
        &self,
        config: &PlannerConfig,
        ctx: &mut RequestContext,
        options: RunOptions,
    ) -> Result<PeerOutput, PeerError> {
        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("peer_run", %run_id);
        self.run_loop(config, ctx, options).instrument(span).await
    }

    async fn run_loop(
        &self,
        config: &PlannerConfig,
        ctx: &mut RequestContext,
        options: RunOptions,
    ) -> Result<PeerOutput, PeerError> {
        config.validate()?;
        let sub_agents = resolve_sub_agents(config, &self.agents)?;
        // 复用的上下文不得带入上一次运行的阶段结果
        ctx.reset_run_state();
        inject_expert_framework(
            config.expert_framework.as_ref(),
            self.tools.as_deref(),
            ctx,
        )
        .await?;

        let emitter = ProgressEmitter::new(options.event_tx);
        let runner = StageRunner {
            agent_info: &self.info,
            emitter: &emitter,
            cancel_token: &options.cancel_token,
        };
        let memory = self.memory.as_deref();
        let jump_step = config.jump_step;
        let mut output = PeerOutput::default();

        info!(
            retry_count = config.retry_count,
            %jump_step,
            eval_threshold = config.eval_threshold,
            sub_agents = sub_agents.len(),
            "PEER loop start"
        );

        for pass in 1..=config.retry_count {
            info!(pass, "PEER pass start");

            if Stage::Planning.runs_on_pass(jump_step, ctx.result(Stage::Planning).is_some()) {
                runner.planning(sub_agents.get(Stage::Planning), ctx).await?;
            }
            if Stage::Executing.runs_on_pass(jump_step, ctx.result(Stage::Executing).is_some()) {
                runner.executing(sub_agents.get(Stage::Executing), ctx).await?;
            }
            if Stage::Expressing.runs_on_pass(jump_step, ctx.result(Stage::Expressing).is_some()) {
                runner.expressing(sub_agents.get(Stage::Expressing), ctx).await?;
            }

            let Some(reviewer) = sub_agents.get(Stage::Reviewing) else {
                output.result.push(IterationRecord::snapshot(ctx));
                record_exchange(memory, ctx);
                info!(pass, "no reviewing agent, PEER loop done");
                return Ok(output);
            };

            let review = runner
                .reviewing(reviewer, ctx, config.eval_threshold)
                .await?;
            output.result.push(IterationRecord::snapshot(ctx));

            if review.score().is_some_and(|score| score >= ACCEPTANCE_SCORE) {
                record_exchange(memory, ctx);
                info!(pass, "review accepted, PEER loop done");
                return Ok(output);
            }
        }

        record_exchange(memory, ctx);
        info!(passes = output.result.len(), "retry_count exhausted, PEER loop done");
        Ok(output)
    }
}
