//! 对话记忆：Memory 协作者接口与 ChatMemory 实现
//!
//! PEER 运行结束时把 (human: 输入, ai: 最终回答) 追加到记忆；
//! 读取时按 token 预算从最旧的消息开始丢弃（FIFO 剪枝），直到满足预算。

use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::memory::{memory_string, Message, TokenEstimator};

/// 读取记忆时的可选参数
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    /// 覆盖记忆自身的 token 预算
    pub max_tokens: Option<usize>,
    /// 剪枝后仅保留最近 N 条
    pub last_n: Option<usize>,
}

/// 记忆协作者：add / get / clear
///
/// 实现需自行保证内部同步（控制器从不并发调用）。
pub trait Memory: Send + Sync {
    /// 追加消息；args 为本次请求的完整原始参数
    fn add(&self, messages: Vec<Message>, args: &Map<String, Value>);

    /// 按查询参数返回（剪枝后的）消息
    fn get(&self, query: &MemoryQuery) -> Vec<Message>;

    fn clear(&self);
}

/// 短期对话记忆：全部消息保存在内存，读取时按 max_tokens 剪枝
pub struct ChatMemory {
    messages: RwLock<Vec<Message>>,
    max_tokens: usize,
}

impl ChatMemory {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            max_tokens,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// 已保存的消息条数（未剪枝）
    pub fn len(&self) -> usize {
        self.messages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 超出预算时从头部丢弃，直到估算 token 数不超过 max_tokens
    fn prune(messages: &[Message], max_tokens: usize) -> Vec<Message> {
        let mut pruned = messages.to_vec();
        while !pruned.is_empty() && TokenEstimator::estimate(&memory_string(&pruned)) > max_tokens {
            pruned.remove(0);
        }
        pruned
    }
}

impl Default for ChatMemory {
    fn default() -> Self {
        Self::new(2000)
    }
}

impl Memory for ChatMemory {
    fn add(&self, messages: Vec<Message>, _args: &Map<String, Value>) {
        if messages.is_empty() {
            return;
        }
        let mut store = self.messages.write().unwrap_or_else(|e| e.into_inner());
        store.extend(messages);
    }

    fn get(&self, query: &MemoryQuery) -> Vec<Message> {
        let store = self.messages.read().unwrap_or_else(|e| e.into_inner());
        let budget = query.max_tokens.unwrap_or(self.max_tokens);
        let mut pruned = Self::prune(&store, budget);
        if let Some(n) = query.last_n {
            let skip = pruned.len().saturating_sub(n);
            pruned.drain(..skip);
        }
        pruned
    }

    fn clear(&self) {
        self.messages.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> Map<String, Value> {
        Map::new()
    }

    #[test]
    fn test_add_ignores_empty_list() {
        let memory = ChatMemory::new(100);
        memory.add(vec![], &no_args());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_get_keeps_everything_within_budget() {
        let memory = ChatMemory::new(1000);
        memory.add(vec![Message::human("hello"), Message::ai("hi there")], &no_args());
        let messages = memory.get(&MemoryQuery::default());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::human("hello"));
    }

    #[test]
    fn test_get_prunes_oldest_first() {
        // 每条约 10 token，预算 25 只能保留最近两条
        let memory = ChatMemory::new(25);
        let long = "x".repeat(36);
        memory.add(
            vec![
                Message::human(format!("a{long}")),
                Message::ai(format!("b{long}")),
                Message::human(format!("c{long}")),
            ],
            &no_args(),
        );
        let messages = memory.get(&MemoryQuery::default());
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.starts_with('b'));
        assert!(messages[1].content.starts_with('c'));
        // 剪枝只影响读取结果，不删除存储
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_query_overrides() {
        let memory = ChatMemory::new(1000);
        memory.add(
            vec![Message::human("1"), Message::ai("2"), Message::human("3")],
            &no_args(),
        );
        let last = memory.get(&MemoryQuery {
            last_n: Some(1),
            ..Default::default()
        });
        assert_eq!(last, vec![Message::human("3")]);

        let none = memory.get(&MemoryQuery {
            max_tokens: Some(0),
            ..Default::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_clear() {
        let memory = ChatMemory::default();
        memory.add(vec![Message::human("q"), Message::ai("a")], &no_args());
        memory.clear();
        assert!(memory.get(&MemoryQuery::default()).is_empty());
    }
}
