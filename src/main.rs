#![deny(clippy::all)]

mod assistant;
mod bridge;
mod config;
mod error;
mod hotkeys;
mod recording;
mod status;
mod storage;
mod transcript;
mod window;

use anyhow::Context;
use bridge::native::NativeBridge;
use bridge::OverlayBridge;
use recording::RecordingController;
use status::StatusLine;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use transcript::TranscriptAssembler;
use window::WindowController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    config::load_env_files();
    let config = config::load();
    info!(
        recognizer = %config.recognizer_path.display(),
        model = %config.model_path.display(),
        pause_window_ms = config.pause_window_ms,
        "Configuration loaded"
    );

    let assistant = assistant::GeminiClient::from_env()
        .context("GEMINI_API_KEY not found - add it to api_keys.env or the environment")?;

    let bridge = Arc::new(NativeBridge::new(assistant));
    let assembler = Arc::new(TranscriptAssembler::new(Duration::from_millis(
        config.pause_window_ms,
    )));
    let window = Arc::new(WindowController::new(bridge.clone()));
    let (status, mut status_rx) = StatusLine::new();

    recording::spawn_event_pump(bridge.as_ref(), assembler.clone(), window.clone());

    if config.hotkeys_enabled {
        match hotkeys::init_hotkeys() {
            Ok(manager) => {
                let bridge_toggle = bridge.clone();
                let bridge_visibility = bridge.clone();
                hotkeys::start_hotkey_listener(hotkeys::HotkeyCallbacks {
                    on_toggle_click_through: Arc::new(move || {
                        bridge_toggle.toggle_click_through_hotkey();
                    }),
                    on_toggle_visibility: Arc::new(move || {
                        bridge_visibility.toggle_visibility_hotkey();
                    }),
                });
                // Keep registrations alive for the process lifetime
                std::mem::forget(manager);
            }
            Err(e) => warn!("Global hotkeys unavailable: {}", e),
        }
    }

    let controller = RecordingController::new(
        bridge.clone(),
        assembler.clone(),
        status.clone(),
        config.recognizer_path.clone(),
        config.model_path.clone(),
        config.transcript_dir.clone(),
    );

    controller.start().await;

    // Shell protocol on stdin: commands prefixed with ':', anything else is
    // a question for the assistant.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_ok() {
                    let message = status_rx.borrow_and_update().clone();
                    if !message.is_empty() {
                        println!("[{}]", message);
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        handle_command(&line, &controller, &window, bridge.as_ref(), &status)
                            .await;
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
        }
    }

    controller.stop().await;
    Ok(())
}

async fn handle_command<B: OverlayBridge>(
    line: &str,
    controller: &RecordingController<B>,
    window: &WindowController<B>,
    bridge: &B,
    status: &StatusLine,
) {
    match line.trim() {
        "" => {}
        ":start" => controller.start().await,
        ":stop" => controller.stop().await,
        ":toggle" => match window.toggle().await {
            Ok(enabled) => println!("[click-through: {}]", enabled),
            Err(e) => status.set(format!("Failed to toggle click-through: {}", e)),
        },
        ":hide" => {
            if let Err(e) = bridge.hide_window().await {
                status.set(format!("Failed to hide window: {}", e));
            }
        }
        ":drag-start" => {
            if let Err(e) = window.begin_drag().await {
                status.set(format!("Failed to start drag: {}", e));
            }
        }
        ":drag-end" => window.end_drag().await,
        question => {
            if let Ok(answer) = controller.ask(question).await {
                if !answer.is_empty() {
                    println!("{}", answer);
                }
            }
        }
    }
}
