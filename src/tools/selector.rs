//! 专家框架选择器
//!
//! 按输入中的关键词从若干领域框架中挑选一段指导文本（不调用 LLM）。
//! 由配置 `[[tools.selectors]]` 声明，注册到 ToolRegistry 后可被 `planner.expert_framework.selector` 引用。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::tokenizer::KeywordMatcher;
use crate::tools::Tool;

/// 一个领域框架：命中任一关键词即参与竞选，命中数最多者胜出
#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkEntry {
    pub keywords: Vec<String>,
    pub framework: String,
}

/// 关键词选择器工具
pub struct KeywordSelectorTool {
    name: String,
    description: String,
    entries: Vec<FrameworkEntry>,
    fallback: Option<String>,
}

impl KeywordSelectorTool {
    pub fn new(name: impl Into<String>, entries: Vec<FrameworkEntry>) -> Self {
        let name = name.into();
        Self {
            description: format!("Select an expert framework for the request ({name})"),
            name,
            entries,
            fallback: None,
        }
    }

    /// 没有任何关键词命中时返回的框架
    pub fn with_fallback(mut self, framework: impl Into<String>) -> Self {
        self.fallback = Some(framework.into());
        self
    }

    /// 返回命中数最多的框架（并列取先声明者）
    pub fn select(&self, input: &str) -> Option<&str> {
        let matcher = KeywordMatcher::new(input);

        let mut best: Option<(&FrameworkEntry, usize)> = None;
        for entry in &self.entries {
            let hits = matcher.count_hits(&entry.keywords);
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, best_hits)) if best_hits >= hits => {}
                _ => best = Some((entry, hits)),
            }
        }

        best.map(|(entry, _)| entry.framework.as_str())
            .or(self.fallback.as_deref())
    }
}

#[async_trait]
impl Tool for KeywordSelectorTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    /// args 为完整请求上下文，读取其中的 input 字段
    async fn execute(&self, args: Value) -> Result<String, String> {
        let input = args
            .get("input")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "selector requires a string 'input' field".to_string())?;
        Ok(self.select(input).unwrap_or_default().to_string())
    }
}
