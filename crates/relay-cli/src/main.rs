use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use relay_core::hooks::{fallible, infallible};
use relay_core::{
    HookConfig, HookParams, HookRegistry, InvokeError, Invokable, MethodCall, QueueConfig,
    Relation, TaskQueue,
};

/// Demo configuration, read from the JSON file given as first argument.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    queue: QueueConfig,
    hooks: HookConfig,
}

/// Pretend remote inventory. Latency grows with the cost of the query.
struct Inventory {
    served: AtomicU32,
}

impl Inventory {
    fn new() -> Self {
        Self {
            served: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Invokable for Inventory {
    async fn invoke(&self, call: MethodCall) -> Result<Value, InvokeError> {
        self.served.fetch_add(1, Ordering::Relaxed);
        match call.method() {
            "Count" => {
                sleep(Duration::from_millis(10)).await;
                Ok(json!(128))
            }
            "Lookup" => {
                sleep(Duration::from_millis(40)).await;
                let sku = call.args().first().cloned().unwrap_or(Value::Null);
                Ok(json!({ "sku": sku, "stock": 7 }))
            }
            "Report" => {
                sleep(Duration::from_millis(120)).await;
                Ok(json!({ "rows": 2048 }))
            }
            other => Err(InvokeError::MethodNotFound(other.to_string())),
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn load_config() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let config = serde_json::from_str(&raw)?;
            tracing::info!(%path, "config loaded");
            Ok(config)
        }
        None => Ok(DemoConfig::default()),
    }
}

async fn run_queue(config: QueueConfig) -> Result<(), Box<dyn std::error::Error>> {
    let inventory = Arc::new(Inventory::new());
    let mut queue: TaskQueue<String> = TaskQueue::new(config);

    queue.submit(
        inventory.clone(),
        MethodCall::new("Count"),
        |v| format!("count  -> {v}"),
        1,
    )?;
    queue.submit(
        inventory.clone(),
        MethodCall::new("Report"),
        |v| format!("report -> {v}"),
        3,
    )?;
    queue.submit(
        inventory.clone(),
        MethodCall::new("Lookup").arg("A-17"),
        |v| format!("lookup -> {v}"),
        2,
    )?;

    let dispatched = queue.dispatch_all()?;
    tracing::info!(dispatched, weights = ?queue.weights(), "dispatched");

    for line in queue.collect_all().await? {
        println!("{line}");
    }
    tracing::info!(served = inventory.served.load(Ordering::Relaxed), "queue drained");
    Ok(())
}

fn run_hooks(config: HookConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut hooks = HookRegistry::with_config(config);
    let save = hooks.add_root(
        "save",
        infallible(|mut p| {
            p.set_arg("saved", true);
            p
        }),
    );
    hooks.add_child(
        save,
        "normalize",
        fallible(|mut p| {
            let name = p.arg_as::<String>("name")?.unwrap_or_default();
            p.set_arg("name", name.trim().to_lowercase());
            Ok(p)
        }),
        Relation::Before,
    )?;
    hooks.add_child_named(
        save,
        "audit",
        infallible(|p| {
            tracing::info!(args = ?p.args, "audit");
            p
        }),
        "after",
    )?;

    let params = HookParams::new().with_arg("name", "  Widget ");
    let out = hooks.invoke(save, params)?;
    println!("save   -> {}", serde_json::to_string(&out.args)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = load_config()?;
    tracing::info!(?config, "starting demo");

    run_queue(config.queue).await?;
    run_hooks(config.hooks)?;
    Ok(())
}
