//! DeepSeek 预设：OpenAI 兼容端点 + 默认模型
//!
//! 模型优先级：`[llm.deepseek] model` > 环境变量 `DEEPSEEK_MODEL` > `[llm] model`；
//! `[llm] base_url` 未设置时使用官方端点。Key 取 `DEEPSEEK_API_KEY`，没有则借用 `OPENAI_API_KEY`。

use crate::config::LlmSection;
use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 按配置解析出的模型名
pub fn deepseek_model(llm: &LlmSection) -> String {
    llm.deepseek
        .model
        .clone()
        .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if llm.model.trim().is_empty() {
                DEEPSEEK_CHAT.to_string()
            } else {
                llm.model.clone()
            }
        })
}

pub fn create_deepseek_client(llm: &LlmSection) -> OpenAiClient {
    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok();
    let base_url = llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
    OpenAiClient::new(Some(base_url), &deepseek_model(llm), api_key.as_deref())
        .with_timeout(llm.request_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_model_wins_over_top_level() {
        let mut llm = LlmSection::default();
        llm.model = "top-level".to_string();
        llm.deepseek.model = Some("deepseek-reasoner".to_string());
        assert_eq!(deepseek_model(&llm), "deepseek-reasoner");
    }
}
