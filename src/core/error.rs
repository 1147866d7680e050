//! PEER 运行错误类型
//!
//! 配置错误在任何阶段执行前返回；子智能体 / 选择器失败与取消会中止整个运行，不返回部分结果。
//! 缺失可选协作者（记忆、工具注册表、事件通道）只记 warning，不属于错误。

use thiserror::Error;

use crate::peer::Stage;

/// PEER 运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum PeerError {
    /// 未知智能体名、未知选择器工具、expert_framework 格式错误、retry_count 为 0、配置文件无法加载
    #[error("Config error: {0}")]
    Config(String),

    /// 子智能体调用失败（携带出错阶段）
    #[error("{stage} agent failed: {reason}")]
    SubAgent { stage: Stage, reason: String },

    /// 专家框架选择器工具执行失败
    #[error("Expert framework selector '{tool}' failed: {reason}")]
    Selector { tool: String, reason: String },

    /// 运行在某阶段被取消
    #[error("Cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl PeerError {
    /// 出错阶段（配置 / 选择器错误发生在循环开始前，返回 None）
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PeerError::SubAgent { stage, .. } | PeerError::Cancelled { stage } => Some(*stage),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PeerError {
    fn from(err: config::ConfigError) -> Self {
        PeerError::Config(err.to_string())
    }
}
