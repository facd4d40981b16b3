//! CLI route: builds the registry for a run and executes commands against it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cli::parse::Commands;
use crate::config::BeaconConfig;
use crate::error::ApiError;
use crate::registry::SessionRegistry;
use crate::render::{JsonRenderer, Renderer, TerminalRenderer};
use crate::session::{SessionConfig, SessionUpdate};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Registry plus runtime settings for one CLI invocation.
pub struct RunContext {
    registry: SessionRegistry,
}

impl RunContext {
    pub fn new(config: BeaconConfig, json: bool, color: bool) -> Self {
        let renderer: Arc<dyn Renderer> = if json {
            Arc::new(JsonRenderer::stdout())
        } else {
            Arc::new(TerminalRenderer::stderr(color))
        };
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: BeaconConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            registry: SessionRegistry::with_config(renderer, config),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let output = match command {
            Commands::Config => render_config(self.registry.config()),
            Commands::Demo { step_ms } => {
                block_on(run_demo(&self.registry, Duration::from_millis(*step_ms)))
            }
            Commands::Notify {
                message,
                duration_ms,
            } => block_on(run_notify(
                &self.registry,
                message,
                duration_ms.map(Duration::from_millis),
            )),
        };

        self.registry.hide_all();
        output
    }
}

fn block_on<F>(operation: F) -> Result<String, ApiError>
where
    F: Future<Output = Result<String, ApiError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(operation)
}

fn render_config(config: &BeaconConfig) -> Result<String, ApiError> {
    toml::to_string_pretty(config)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
}

async fn run_notify(
    registry: &SessionRegistry,
    message: &str,
    duration: Option<Duration>,
) -> Result<String, ApiError> {
    let id = registry.show_notification(message, duration);
    wait_until_hidden(registry, &id).await;
    Ok(format!("notification {} expired", id))
}

async fn wait_until_hidden(registry: &SessionRegistry, id: &str) {
    while registry.is_active(id) {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn run_demo(registry: &SessionRegistry, step: Duration) -> Result<String, ApiError> {
    info!(step_ms = step.as_millis() as u64, "starting demo");

    let phases = ["fetch", "compile", "link"];
    let build = registry.show(
        "build",
        SessionConfig::new()
            .title("Building")
            .message("Starting build")
            .phases(phases),
    );
    for step_index in 0..=10u32 {
        let progress = f64::from(step_index) * 10.0;
        let phase = (step_index as usize * phases.len() / 11).min(phases.len() - 1);
        registry.update(
            &build,
            SessionUpdate::new()
                .progress(progress)
                .phase(phase)
                .message(format!("Running {}", phases[phase]))
                .show_elapsed(),
        );
        tokio::time::sleep(step).await;
    }
    registry.update(&build, SessionUpdate::new().message("Finalizing"));
    registry.set_indeterminate(&build);
    tokio::time::sleep(step).await;
    registry.hide(&build);

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    let download = registry.show(
        "download",
        SessionConfig::new()
            .title("Downloading")
            .cancellable(true)
            .on_cancel(move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
    );
    registry.update(&download, SessionUpdate::new().progress(35.0));
    tokio::time::sleep(step).await;
    registry.cancel_bus().trigger(download.clone()).map_err(|e| {
        ApiError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?;
    registry.pump_cancellations();

    let indexed = registry
        .track(
            async {
                tokio::time::sleep(step * 3).await;
                Ok::<usize, ApiError>(128)
            },
            SessionConfig::new().title("Indexing").message("Scanning entries"),
        )
        .await?;

    let note = registry.show_notification("Demo complete", Some(step * 4));
    wait_until_hidden(registry, &note).await;

    Ok(format!(
        "build finished; download cancelled: {}; indexed {} entries",
        cancelled.load(Ordering::SeqCst),
        indexed
    ))
}
