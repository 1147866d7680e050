//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PEER__*` 覆盖（双下划线表示嵌套，如 `PEER__PLANNER__RETRY_COUNT=3`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::PeerError;
use crate::peer::Stage;
use crate::tools::FrameworkEntry;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub planner: PlannerConfig,
    pub memory: MemorySection,
    pub tools: ToolsSection,
}

/// [app] 段：驱动本次运行的 PEER 智能体自身的描述信息（随进度事件下发）
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn default_app_name() -> String {
    "peer".to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            description: String::new(),
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；非 mock 时优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmModelSection,
    #[serde(default)]
    pub openai: LlmModelSection,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            deepseek: LlmModelSection::default(),
            openai: LlmModelSection::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelSection {
    pub model: Option<String>,
}

/// [planner.expert_framework] 段：静态文本与选择器工具二选一
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ExpertFrameworkConfig {
    pub context: Option<String>,
    /// ToolRegistry 中选择器工具的名字
    pub selector: Option<String>,
}

/// [planner] 段：PEER 循环配置
///
/// 每个角色：不配置时使用默认智能体名；配置为空字符串表示禁用该角色。
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlannerConfig {
    #[serde(default)]
    pub planning: Option<String>,
    #[serde(default)]
    pub executing: Option<String>,
    #[serde(default)]
    pub expressing: Option<String>,
    #[serde(default)]
    pub reviewing: Option<String>,
    /// 最多迭代轮数（正整数）
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,
    /// 第二轮起从哪个阶段开始重新执行
    #[serde(default = "default_jump_step")]
    pub jump_step: Stage,
    /// 评审分数阈值（只用于日志，终止判断使用 ACCEPTANCE_SCORE）
    #[serde(default = "default_eval_threshold")]
    pub eval_threshold: f64,
    #[serde(default)]
    pub expert_framework: Option<ExpertFrameworkConfig>,
}

fn default_retry_count() -> usize {
    2
}

fn default_jump_step() -> Stage {
    Stage::Expressing
}

fn default_eval_threshold() -> f64 {
    60.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            planning: None,
            executing: None,
            expressing: None,
            reviewing: None,
            retry_count: default_retry_count(),
            jump_step: default_jump_step(),
            eval_threshold: default_eval_threshold(),
            expert_framework: None,
        }
    }
}

impl PlannerConfig {
    /// 角色配置的智能体名（None 表示未配置）
    pub fn agent_name(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Planning => self.planning.as_deref(),
            Stage::Executing => self.executing.as_deref(),
            Stage::Expressing => self.expressing.as_deref(),
            Stage::Reviewing => self.reviewing.as_deref(),
        }
    }

    fn slot_mut(&mut self, stage: Stage) -> &mut Option<String> {
        match stage {
            Stage::Planning => &mut self.planning,
            Stage::Executing => &mut self.executing,
            Stage::Expressing => &mut self.expressing,
            Stage::Reviewing => &mut self.reviewing,
        }
    }

    /// 指定角色使用的智能体
    pub fn with_agent(mut self, stage: Stage, name: impl Into<String>) -> Self {
        *self.slot_mut(stage) = Some(name.into());
        self
    }

    /// 禁用角色（等价于配置空字符串）
    pub fn without(mut self, stage: Stage) -> Self {
        *self.slot_mut(stage) = Some(String::new());
        self
    }

    pub fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_jump_step(mut self, jump_step: Stage) -> Self {
        self.jump_step = jump_step;
        self
    }

    pub fn with_expert_context(mut self, context: impl Into<String>) -> Self {
        self.expert_framework = Some(ExpertFrameworkConfig {
            context: Some(context.into()),
            selector: None,
        });
        self
    }

    pub fn with_expert_selector(mut self, tool: impl Into<String>) -> Self {
        self.expert_framework = Some(ExpertFrameworkConfig {
            context: None,
            selector: Some(tool.into()),
        });
        self
    }

    /// 运行前校验：retry_count 为正、expert_framework 的 context 与 selector 不可同时设置
    pub fn validate(&self) -> Result<(), PeerError> {
        if self.retry_count == 0 {
            return Err(PeerError::Config(
                "planner.retry_count must be a positive integer".to_string(),
            ));
        }
        if !self.eval_threshold.is_finite() {
            return Err(PeerError::Config(
                "planner.eval_threshold must be a finite number".to_string(),
            ));
        }
        if let Some(ef) = &self.expert_framework {
            if ef.context.is_some() && ef.selector.is_some() {
                return Err(PeerError::Config(
                    "planner.expert_framework: `context` and `selector` are mutually exclusive"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// [memory] 段：对话记忆开关与 token 预算
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,
    #[serde(default = "default_memory_max_tokens")]
    pub max_tokens: usize,
}

fn default_memory_enabled() -> bool {
    true
}

fn default_memory_max_tokens() -> usize {
    2000
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            max_tokens: default_memory_max_tokens(),
        }
    }
}

/// [tools] 段：专家框架选择器
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsSection {
    #[serde(default)]
    pub selectors: Vec<SelectorSection>,
}

/// [[tools.selectors]]：关键词选择器工具
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSection {
    pub name: String,
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub entries: Vec<FrameworkEntry>,
}

/// 从 config 目录加载配置，环境变量 PEER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PEER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PEER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
