//! Peer 命令行入口
//!
//! 用法：`peer [--config path/to/config.toml] <问题>`
//! 逐阶段把进度事件打印到 stderr，运行结果 JSON 打印到 stdout。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use peer::agent::{register_default_agents, AgentInfo, AgentRegistry};
use peer::config::load_config;
use peer::llm::create_llm_from_config;
use peer::memory::ChatMemory;
use peer::peer::{PeerPlanner, RequestContext, RunOptions};
use peer::tools::{KeywordSelectorTool, ToolRegistry};
use tokio_util::sync::CancellationToken;

fn parse_args() -> anyhow::Result<(Option<PathBuf>, String)> {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            let path = args.next().context("--config requires a path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            words.push(arg);
        }
    }
    if words.is_empty() {
        bail!("usage: peer [--config <file>] <question>");
    }
    Ok((config_path, words.join(" ")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    peer::observability::init();

    let (config_path, input) = parse_args()?;
    let cfg = load_config(config_path).context("Failed to load config")?;

    let llm = create_llm_from_config(&cfg);
    let mut agents = AgentRegistry::new();
    register_default_agents(&mut agents, llm.clone());

    let mut tools = ToolRegistry::new();
    for section in &cfg.tools.selectors {
        let mut selector = KeywordSelectorTool::new(&section.name, section.entries.clone());
        if let Some(fallback) = &section.fallback {
            selector = selector.with_fallback(fallback);
        }
        tools.register(selector);
    }
    tracing::info!(selectors = ?tools.tool_names(), "expert framework selectors registered");

    let mut planner = PeerPlanner::new(agents)
        .with_tools(Arc::new(tools))
        .with_info(AgentInfo::new(&cfg.app.name, &cfg.app.description));
    if cfg.memory.enabled {
        planner = planner.with_memory(Arc::new(ChatMemory::new(cfg.memory.max_tokens)));
    }

    // Ctrl-C 取消当前运行
    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{}", line),
                Err(e) => tracing::warn!("failed to serialize event: {}", e),
            }
        }
    });

    let mut ctx = RequestContext::new(input);
    let options = RunOptions::new()
        .with_event_tx(event_tx)
        .with_cancel_token(cancel_token);
    let result = planner.run(&cfg.planner, &mut ctx, options).await;
    // RunOptions 已在运行结束时释放发送端，打印任务随之退出
    let _ = printer.await;

    let (prompt_tokens, completion_tokens, total_tokens) = llm.token_usage();
    tracing::info!(prompt_tokens, completion_tokens, total_tokens, "LLM token usage");

    let output = result.context("PEER run failed")?;
    if let Some(answer) = output.final_output() {
        tracing::info!(passes = output.result.len(), %answer, "PEER final answer");
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
