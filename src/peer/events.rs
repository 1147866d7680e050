//! 进度事件：每个阶段结束后推送一条 `{data, type}`，供 SSE / 流式前端展示
//!
//! 投递是 fire-and-forget：没有订阅者或接收端已关闭时静默丢弃。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::peer::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerEvent {
    pub data: Value,
    #[serde(rename = "type")]
    pub stage: Stage,
}

/// 可选事件通道的薄封装
#[derive(Debug, Clone, Default)]
pub struct ProgressEmitter {
    tx: Option<UnboundedSender<PeerEvent>>,
}

impl ProgressEmitter {
    pub fn new(tx: Option<UnboundedSender<PeerEvent>>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, stage: Stage, data: Value) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(PeerEvent { data, stage });
        }
    }
}
