//! 智能体注册表
//!
//! 进程启动时按名注册 Arc<dyn Agent>；解析角色时精确匹配名字。

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::Agent;

#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 info().name 注册；同名覆盖
    pub fn register(&mut self, agent: impl Agent + 'static) {
        self.register_arc(Arc::new(agent));
    }

    pub fn register_arc(&mut self, agent: Arc<dyn Agent>) {
        let name = agent.info().name;
        tracing::debug!(agent = %name, "registering agent");
        self.agents.insert(name, agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
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
            AgentInfo::new(self.0, "test agent")
        }

        async fn invoke(&self, _ctx: &RequestContext) -> Result<StageResult, String> {
            Ok(StageResult::new().with("output", self.0))
        }
    }

    #[test]
    fn test_register_and_lookup_by_exact_name() {
        let mut registry = AgentRegistry::new();
        registry.register(Named("PlanningAgent"));
        registry.register(Named("ReviewingAgent"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("PlanningAgent").is_some());
        assert!(registry.get("planningagent").is_none());
        assert_eq!(
            registry.agent_names(),
            vec!["PlanningAgent".to_string(), "ReviewingAgent".to_string()]
        );
    }
}
