//! PEER 的四个固定阶段及跳步规则

use std::fmt;

use serde::{Deserialize, Serialize};

/// 固定顺序：planning -> executing -> expressing -> reviewing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Planning,
    Executing,
    Expressing,
    Reviewing,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Planning,
        Stage::Executing,
        Stage::Expressing,
        Stage::Reviewing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Planning => "planning",
            Stage::Executing => "executing",
            Stage::Expressing => "expressing",
            Stage::Reviewing => "reviewing",
        }
    }

    /// 阶段在固定顺序中的位置
    pub fn index(&self) -> usize {
        match self {
            Stage::Planning => 0,
            Stage::Executing => 1,
            Stage::Expressing => 2,
            Stage::Reviewing => 3,
        }
    }

    /// 未配置时使用的默认智能体名
    pub fn default_agent_name(&self) -> &'static str {
        match self {
            Stage::Planning => "PlanningAgent",
            Stage::Executing => "ExecutingAgent",
            Stage::Expressing => "ExpressingAgent",
            Stage::Reviewing => "ReviewingAgent",
        }
    }

    /// 请求上下文中的结果槽名
    pub fn slot_name(&self) -> &'static str {
        match self {
            Stage::Planning => "planning_result",
            Stage::Executing => "executing_result",
            Stage::Expressing => "expressing_result",
            Stage::Reviewing => "reviewing_result",
        }
    }

    /// 本轮是否执行该阶段：从未产出过结果，或 jump_step 不晚于该阶段
    pub fn runs_on_pass(&self, jump_step: Stage, has_result: bool) -> bool {
        !has_result || jump_step.index() <= self.index()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
