//! 专家框架注入
//!
//! 循环开始前执行一次：配置了 selector 则以完整上下文调用该工具并写入结果；
//! 否则配置了 context 则原样写入静态文本；都没有则不修改上下文。

use tracing::{info, warn};

use crate::config::ExpertFrameworkConfig;
use crate::core::PeerError;
use crate::peer::RequestContext;
use crate::tools::ToolRegistry;

pub async fn inject_expert_framework(
    config: Option<&ExpertFrameworkConfig>,
    tools: Option<&ToolRegistry>,
    ctx: &mut RequestContext,
) -> Result<(), PeerError> {
    let Some(config) = config else {
        return Ok(());
    };

    if let Some(selector) = config.selector.as_deref() {
        let Some(tools) = tools else {
            warn!(selector, "no tool registry attached, expert framework selector skipped");
            return Ok(());
        };
        let tool = tools.get(selector).ok_or_else(|| {
            PeerError::Config(format!(
                "unknown expert framework selector '{selector}' (registered: [{}])",
                tools.tool_names().join(", ")
            ))
        })?;
        let framework = tool
            .execute(ctx.to_value())
            .await
            .map_err(|reason| PeerError::Selector {
                tool: selector.to_string(),
                reason,
            })?;
        info!(selector, chars = framework.chars().count(), "expert framework selected");
        ctx.set_expert_framework(framework);
    } else if let Some(context) = config.context.as_deref() {
        ctx.set_expert_framework(context);
    }

    Ok(())
}
