//! PEER 多智能体规划循环：Plan -> Execute -> Express -> Review
//!
//! 子智能体按名从 AgentRegistry 解析；RequestContext 在各阶段间以 `&mut` 传递，
//! 每轮结束追加一条 IterationRecord。

mod adapter;
pub mod context;
pub mod events;
pub mod expert;
pub mod loop_;
pub mod recorder;
pub mod resolver;
pub mod stage;

pub use context::{IterationRecord, PeerOutput, RequestContext, StageResult};
pub use events::{PeerEvent, ProgressEmitter};
pub use expert::inject_expert_framework;
pub use loop_::{PeerPlanner, RunOptions, ACCEPTANCE_SCORE};
pub use recorder::record_exchange;
pub use resolver::{resolve_sub_agents, SubAgents};
pub use stage::Stage;
