//! 请求上下文与阶段结果
//!
//! RequestContext 在一次运行内以 `&mut` 在各阶段间传递；结果槽只能由对应阶段的包装器写入，
//! 其它阶段与子智能体只读。IterationRecord 是每轮四个阶段结果的快照，追加后不再修改。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::peer::Stage;

/// 子智能体的结构化输出：以键取值的 JSON 对象，至少约定 `output`，评审还约定 `suggestion` / `score`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageResult(Map<String, Value>);

impl StageResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn output(&self) -> Option<&Value> {
        self.get_data("output")
    }

    /// output 的文本形式：字符串原样，其它 JSON 紧凑序列化，缺失或 null 为空串
    pub fn output_text(&self) -> String {
        match self.output() {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// 评审分数：JSON 数字或可解析为数字的字符串
    pub fn score(&self) -> Option<f64> {
        match self.get_data("score")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 完整序列化
    pub fn to_dict(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 一次运行共享的请求上下文
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    input: String,
    /// 除 input 外的原始请求字段
    fields: Map<String, Value>,
    expert_framework: Option<String>,
    planning_result: Option<StageResult>,
    executing_result: Option<StageResult>,
    expressing_result: Option<StageResult>,
    reviewing_result: Option<StageResult>,
}

impl RequestContext {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// 从原始请求参数构造；`input` 字段取出作为输入文本（非字符串时序列化，缺失为空）
    pub fn from_args(mut args: Map<String, Value>) -> Self {
        let input = match args.remove("input") {
            Some(Value::String(s)) => s,
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            input,
            fields: args,
            ..Default::default()
        }
    }

    /// 附加原始请求字段（如 session_id）
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 原始请求参数（input + 其它字段），不含任何阶段结果
    pub fn args(&self) -> Map<String, Value> {
        let mut args = self.fields.clone();
        args.insert("input".to_string(), Value::String(self.input.clone()));
        args
    }

    pub fn expert_framework(&self) -> Option<&str> {
        self.expert_framework.as_deref()
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        match stage {
            Stage::Planning => self.planning_result.as_ref(),
            Stage::Executing => self.executing_result.as_ref(),
            Stage::Expressing => self.expressing_result.as_ref(),
            Stage::Reviewing => self.reviewing_result.as_ref(),
        }
    }

    pub(crate) fn set_result(&mut self, stage: Stage, result: StageResult) {
        let slot = match stage {
            Stage::Planning => &mut self.planning_result,
            Stage::Executing => &mut self.executing_result,
            Stage::Expressing => &mut self.expressing_result,
            Stage::Reviewing => &mut self.reviewing_result,
        };
        *slot = Some(result);
    }

    /// 清空四个结果槽与专家框架，只保留原始请求字段
    pub(crate) fn reset_run_state(&mut self) {
        self.expert_framework = None;
        self.planning_result = None;
        self.executing_result = None;
        self.expressing_result = None;
        self.reviewing_result = None;
    }

    pub(crate) fn set_expert_framework(&mut self, framework: impl Into<String>) {
        self.expert_framework = Some(framework.into());
    }

    /// 完整 JSON 视图：原始参数 + expert_framework + 已写入的结果槽
    pub fn to_value(&self) -> Value {
        let mut map = self.args();
        if let Some(ef) = &self.expert_framework {
            map.insert("expert_framework".to_string(), Value::String(ef.clone()));
        }
        for stage in Stage::ALL {
            if let Some(result) = self.result(stage) {
                map.insert(stage.slot_name().to_string(), result.to_dict());
            }
        }
        Value::Object(map)
    }
}

/// 单轮快照：四个阶段结果（本次运行尚未执行过的阶段为空结果）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub planning_result: StageResult,
    pub executing_result: StageResult,
    pub expressing_result: StageResult,
    pub reviewing_result: StageResult,
}

impl IterationRecord {
    /// 从上下文当前的结果槽拍快照
    pub fn snapshot(ctx: &RequestContext) -> Self {
        let take = |stage| ctx.result(stage).cloned().unwrap_or_default();
        Self {
            planning_result: take(Stage::Planning),
            executing_result: take(Stage::Executing),
            expressing_result: take(Stage::Expressing),
            reviewing_result: take(Stage::Reviewing),
        }
    }

    pub fn get(&self, stage: Stage) -> &StageResult {
        match stage {
            Stage::Planning => &self.planning_result,
            Stage::Executing => &self.executing_result,
            Stage::Expressing => &self.expressing_result,
            Stage::Reviewing => &self.reviewing_result,
        }
    }
}

/// 运行结果：`{"result": [IterationRecord, ...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerOutput {
    pub result: Vec<IterationRecord>,
}

impl PeerOutput {
    /// 最后一轮表达阶段的 output
    pub fn final_output(&self) -> Option<&Value> {
        self.result.last().and_then(|r| r.expressing_result.output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_parsing() {
        assert_eq!(StageResult::new().with("score", 80).score(), Some(80.0));
        assert_eq!(StageResult::new().with("score", "95.5").score(), Some(95.5));
        assert_eq!(StageResult::new().with("score", "n/a").score(), None);
        assert_eq!(StageResult::new().score(), None);
    }

    #[test]
    fn test_output_text_rendering() {
        assert_eq!(StageResult::new().with("output", "plain").output_text(), "plain");
        assert_eq!(StageResult::new().with("output", json!([1, 2])).output_text(), "[1,2]");
        assert_eq!(StageResult::new().with("output", Value::Null).output_text(), "");
        assert_eq!(StageResult::new().output_text(), "");
    }

    #[test]
    fn test_final_output_is_last_expressing_output() {
        let mut first = IterationRecord::default();
        first.expressing_result.insert("output", "v1");
        let mut second = IterationRecord::default();
        second.expressing_result.insert("output", "v2");
        let out = PeerOutput { result: vec![first, second] };
        assert_eq!(out.final_output(), Some(&json!("v2")));
        assert_eq!(PeerOutput::default().final_output(), None);
    }

    #[test]
    fn test_context_from_args_and_to_value() {
        let mut args = Map::new();
        args.insert("input".into(), json!("hello"));
        args.insert("session_id".into(), json!("s1"));
        let mut ctx = RequestContext::from_args(args);
        assert_eq!(ctx.input(), "hello");
        assert_eq!(ctx.field("session_id"), Some(&json!("s1")));

        ctx.set_expert_framework("framework text");
        ctx.set_result(Stage::Planning, StageResult::new().with("framework", json!(["a"])));

        let v = ctx.to_value();
        assert_eq!(v["input"], json!("hello"));
        assert_eq!(v["expert_framework"], json!("framework text"));
        assert_eq!(v["planning_result"]["framework"], json!(["a"]));
        assert!(v.get("executing_result").is_none());

        // args 只含原始请求字段
        let args = ctx.args();
        assert_eq!(args.len(), 2);
        assert!(args.get("planning_result").is_none());
    }

    #[test]
    fn test_reset_run_state_keeps_request_fields() {
        let mut ctx = RequestContext::new("q").with_field("session_id", "s1");
        ctx.set_expert_framework("ef");
        for stage in Stage::ALL {
            ctx.set_result(stage, StageResult::new().with("output", "x"));
        }

        ctx.reset_run_state();
        assert!(ctx.expert_framework().is_none());
        assert!(Stage::ALL.iter().all(|s| ctx.result(*s).is_none()));
        assert_eq!(ctx.input(), "q");
        assert_eq!(ctx.field("session_id"), Some(&json!("s1")));
    }

    #[test]
    fn test_snapshot_fills_missing_slots_with_empty() {
        let mut ctx = RequestContext::new("q");
        ctx.set_result(Stage::Expressing, StageResult::new().with("output", "answer"));
        let record = IterationRecord::snapshot(&ctx);
        assert!(record.planning_result.is_empty());
        assert!(record.reviewing_result.is_empty());
        assert_eq!(record.get(Stage::Expressing).output_text(), "answer");
    }

    #[test]
    fn test_peer_output_serializes_as_result_list() {
        let out = PeerOutput {
            result: vec![IterationRecord::default()],
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["result"][0]["reviewing_result"], json!({}));
    }
}
