//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock），供默认 PEER 智能体使用

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, deepseek_model, DEEPSEEK_CHAT};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::LlmClient;

use std::sync::Arc;

use crate::config::AppConfig;

/// 实际使用的后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    DeepSeek,
    OpenAi,
    Mock,
}

/// 由配置的 provider 与可用的 API Key 决定后端
///
/// - `mock`：始终 Mock
/// - `openai`：有 OPENAI_API_KEY 用 OpenAI，否则 Mock（不会因为存在 DEEPSEEK_API_KEY 改走 DeepSeek）
/// - `deepseek`：有 DEEPSEEK_API_KEY 或 OPENAI_API_KEY 即用 DeepSeek 端点
/// - 其它：有 DEEPSEEK_API_KEY 用 DeepSeek，其次 OpenAI，否则 Mock
pub fn choose_backend(provider: &str, has_deepseek_key: bool, has_openai_key: bool) -> Backend {
    match provider.trim().to_lowercase().as_str() {
        "mock" => Backend::Mock,
        "openai" if has_openai_key => Backend::OpenAi,
        "openai" => Backend::Mock,
        "deepseek" if has_deepseek_key || has_openai_key => Backend::DeepSeek,
        "deepseek" => Backend::Mock,
        _ if has_deepseek_key => Backend::DeepSeek,
        _ if has_openai_key => Backend::OpenAi,
        _ => Backend::Mock,
    }
}

/// 按配置与环境变量创建 LLM 客户端
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let openai_key = std::env::var("OPENAI_API_KEY").ok();
    let backend = choose_backend(
        &cfg.llm.provider,
        std::env::var("DEEPSEEK_API_KEY").is_ok(),
        openai_key.is_some(),
    );

    match backend {
        Backend::DeepSeek => {
            let client = create_deepseek_client(&cfg.llm);
            tracing::info!("Using DeepSeek LLM ({})", deepseek_model(&cfg.llm));
            Arc::new(client)
        }
        Backend::OpenAi => {
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, openai_key.as_deref())
                    .with_timeout(cfg.llm.request_timeout_secs),
            )
        }
        Backend::Mock => {
            if cfg.llm.provider.eq_ignore_ascii_case("mock") {
                tracing::info!("Using Mock LLM (configured)");
            } else {
                tracing::warn!(
                    provider = %cfg.llm.provider,
                    "No API key for the configured provider, using Mock LLM"
                );
            }
            Arc::new(MockLlmClient::new())
        }
    }
}
