//! Replay demo: runs one speech session against a scripted recognizer.
//!
//! ```text
//! speech-capture [script.toml]
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`CaptureConfig`] from disk (defaults on first run).
//! 3. Load the replay script, or fall back to the built-in one.
//! 4. Run one session on a current-thread tokio runtime, printing every
//!    notification as a JSON line and feeding it to an [`InputComposer`].
//! 5. Print the composed input value.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use speech_capture::{
    CaptureConfig, InputComposer, PermissionGate, RecognizerEvent, ReplayScript,
    ScriptedRecognizer, SessionConsumer, SpeechCapture, StaticMicrophone,
};

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let config = CaptureConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        CaptureConfig::default()
    });
    if CaptureConfig::is_first_run() {
        log::info!("No settings file yet; using defaults");
    }

    // 3. Replay script
    let script = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ReplayScript::load_from(&path)
            .with_context(|| format!("failed to load replay script {}", path.display()))?,
        None => builtin_script(),
    };

    // 4. Session
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let value = rt.block_on(run(config, script))?;

    // 5. Result
    println!("{value}");
    Ok(())
}

async fn run(config: CaptureConfig, script: ReplayScript) -> Result<String> {
    let recognizer = Arc::new(ScriptedRecognizer::new([script]));
    let stats = recognizer.stats();
    let gate = Arc::new(PermissionGate::new(Arc::new(StaticMicrophone::granted())));
    let capture = SpeechCapture::new(recognizer, gate, &config.runtime);

    let capabilities = capture.capabilities();
    log::info!("Capabilities: {}", serde_json::to_string(&capabilities)?);

    let mut input = InputComposer::new(config.session.max_length);
    let (handle, mut notifications) = capture.start(config.session.clone())?;

    while let Some(notification) = notifications.recv().await {
        println!("{}", serde_json::to_string(&notification)?);
        input.dispatch(&notification);
    }
    handle.released().await;

    let snapshot = handle.snapshot();
    log::info!(
        "Session {} finished: {} (stop reason {:?}, {} stream(s) opened)",
        snapshot.id,
        snapshot.state.label(),
        snapshot.stop_reason,
        stats.opens()
    );
    if let Some(error) = input.last_error() {
        log::warn!("{}", error.message);
    }

    Ok(input.value().to_string())
}

/// A short check-in dictation that goes quiet until the silence timer fires.
fn builtin_script() -> ReplayScript {
    ReplayScript::new()
        .step(300, RecognizerEvent::interim("how are"))
        .step(300, RecognizerEvent::interim("how are you feel"))
        .step(400, RecognizerEvent::final_text("how are you feeling"))
        .step(500, RecognizerEvent::interim("pretty"))
        .step(400, RecognizerEvent::final_text("pretty good today"))
        .hold_open()
        .close_latency(100)
}
