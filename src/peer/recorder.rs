//! 运行结束时把本轮问答写入对话记忆

use tracing::debug;

use crate::memory::{Memory, Message};
use crate::peer::{RequestContext, Stage};

/// 追加 (human: 输入, ai: 最终表达输出) 两条消息，连同完整原始请求参数
///
/// 未配置记忆时不做任何事；输入为空也照常写入。
pub fn record_exchange(memory: Option<&dyn Memory>, ctx: &RequestContext) {
    let Some(memory) = memory else {
        return;
    };

    let answer = ctx
        .result(Stage::Expressing)
        .map(|r| r.output_text())
        .unwrap_or_default();
    let messages = vec![Message::human(ctx.input()), Message::ai(answer)];
    let args = ctx.args();
    let fields: Vec<&String> = args.keys().collect();
    debug!(?fields, "add peer memory");
    memory.add(messages, &args);
}
