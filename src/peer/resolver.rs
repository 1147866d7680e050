//! 子智能体解析：角色 -> 智能体句柄
//!
//! 空字符串禁用角色；未配置使用默认名；显式配置的名字找不到是配置错误。
//! 默认名未注册时该角色降级为缺席（由阶段包装器给出默认结果）。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::{Agent, AgentRegistry};
use crate::config::PlannerConfig;
use crate::core::PeerError;
use crate::peer::Stage;

/// 本次运行生效的子智能体（0–4 个）
#[derive(Default, Clone)]
pub struct SubAgents {
    agents: HashMap<Stage, Arc<dyn Agent>>,
}

impl SubAgents {
    pub fn get(&self, stage: Stage) -> Option<&Arc<dyn Agent>> {
        self.agents.get(&stage)
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.agents.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

pub fn resolve_sub_agents(
    config: &PlannerConfig,
    registry: &AgentRegistry,
) -> Result<SubAgents, PeerError> {
    let mut agents = HashMap::new();

    for stage in Stage::ALL {
        match config.agent_name(stage) {
            Some("") => {
                debug!(%stage, "role disabled by configuration");
            }
            Some(name) => {
                let agent = registry.get(name).ok_or_else(|| {
                    PeerError::Config(format!("unknown {stage} agent '{name}'"))
                })?;
                agents.insert(stage, agent);
            }
            None => match registry.get(stage.default_agent_name()) {
                Some(agent) => {
                    agents.insert(stage, agent);
                }
                None => {
                    warn!(
                        %stage,
                        default = stage.default_agent_name(),
                        "default agent not registered, stage will degrade"
                    );
                }
            },
        }
    }

    Ok(SubAgents { agents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentInfo;
    use crate::peer::{RequestContext, StageResult};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Agent for Named {
        fn info(&self) -> AgentInfo {
            AgentInfo::new(self.0, "")
        }

        async fn invoke(&self, _ctx: &RequestContext) -> Result<StageResult, String> {
            Ok(StageResult::new())
        }
    }

    fn registry() -> AgentRegistry {
        let mut r = AgentRegistry::new();
        for stage in Stage::ALL {
            r.register(Named(stage.default_agent_name()));
        }
        r.register(Named("CustomReviewer"));
        r
    }

    #[test]
    fn test_defaults_fill_unset_roles() {
        let agents = resolve_sub_agents(&PlannerConfig::default(), &registry()).unwrap();
        assert_eq!(agents.len(), 4);
        assert_eq!(agents.get(Stage::Planning).unwrap().info().name, "PlanningAgent");
    }

    #[test]
    fn test_empty_string_disables_role() {
        let cfg = PlannerConfig::default().without(Stage::Reviewing);
        let agents = resolve_sub_agents(&cfg, &registry()).unwrap();
        assert_eq!(agents.len(), 3);
        assert!(!agents.contains(Stage::Reviewing));
    }

    #[test]
    fn test_configured_name_is_used() {
        let cfg = PlannerConfig::default().with_agent(Stage::Reviewing, "CustomReviewer");
        let agents = resolve_sub_agents(&cfg, &registry()).unwrap();
        assert_eq!(agents.get(Stage::Reviewing).unwrap().info().name, "CustomReviewer");
    }

    #[test]
    fn test_unknown_configured_name_is_fatal() {
        let cfg = PlannerConfig::default().with_agent(Stage::Executing, "Ghost");
        let err = resolve_sub_agents(&cfg, &registry()).err().unwrap();
        assert!(matches!(err, PeerError::Config(ref m) if m.contains("Ghost")));
    }

    #[test]
    fn test_missing_default_degrades() {
        let agents = resolve_sub_agents(&PlannerConfig::default(), &AgentRegistry::new()).unwrap();
        assert!(agents.is_empty());
    }
}
