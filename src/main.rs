//! Application entry point: a console pronunciation coach.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Load the Whisper model, or fall back to [`UnavailableRecognizer`] so the
//!    app still starts without a model file.
//! 5. Build the [`PracticeCoach`] around the cpal microphone.
//! 6. Run the practice loop on stdin until EOF or `quit`.
//!
//! # Practice loop
//!
//! ```text
//! > type a sentence, Enter      start recording
//! > Enter                       stop and score
//! > "cancel"                    drop the attempt
//! ```

use std::sync::Arc;

use anyhow::Result;
use phono_coach::{
    audio::{CpalDevice, MicrophoneLock},
    config::{AppConfig, AppPaths},
    pipeline::{Outcome, PracticeCoach, PracticeRequest},
    recognition::{
        find_model_by_id, ModelPaths, SpeechRecognizer, UnavailableRecognizer, WhisperRecognizer,
    },
    scoring::AlignmentOp,
    text::format_timestamp,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

// ---------------------------------------------------------------------------
// Recognizer
// ---------------------------------------------------------------------------

fn build_recognizer(config: &AppConfig) -> Arc<dyn SpeechRecognizer> {
    let Some(info) = find_model_by_id(&config.recognition.model) else {
        log::warn!("Unknown model id {:?}; recognition disabled", config.recognition.model);
        return Arc::new(UnavailableRecognizer::new(format!(
            "unknown model id {:?}",
            config.recognition.model
        )));
    };

    let paths = ModelPaths::from_app_paths(&AppPaths::new());
    let model_path = paths.model_path(info);

    match WhisperRecognizer::load(&model_path, config.recognition.use_gpu) {
        Ok(engine) => {
            log::info!("Whisper model loaded: {}", model_path.display());
            Arc::new(engine)
        }
        Err(e) => {
            log::warn!(
                "Could not load Whisper model ({}): {e}. Recognition will return an error.",
                model_path.display()
            );
            Arc::new(UnavailableRecognizer::new(e.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Practice loop
// ---------------------------------------------------------------------------

async fn next_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn run(coach: PracticeCoach, config: AppConfig) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a sentence and press Enter to start recording (\"quit\" to exit).");

    while let Some(target) = next_line(&mut lines).await? {
        if target.is_empty() {
            continue;
        }
        if target == "quit" {
            break;
        }

        let request = PracticeRequest::new(target, config.practice.language.clone())
            .with_punctuation(config.practice.with_punctuation);

        let session = match coach.start(request).await {
            Ok(id) => id,
            Err(e) => {
                println!("Could not start recording: {e}");
                continue;
            }
        };
        println!("Recording {session}... press Enter to stop, or type \"cancel\".");

        let command = next_line(&mut lines).await?.unwrap_or_default();

        if let Some(status) = coach.recording_status() {
            log::debug!(
                "main: session {} captured {} chunks ({} bytes)",
                status.session,
                status.chunks,
                status.bytes
            );
        }

        if command == "cancel" {
            coach.cancel()?;
            println!("Attempt {session} cancelled.");
            continue;
        }

        match coach.stop().await {
            Ok(report) => {
                println!(
                    "Heard: {:?} ({})",
                    report.transcription,
                    format_timestamp(f64::from(report.audio_secs))
                );
                for op in report.alignment.ops() {
                    match op {
                        AlignmentOp::Correct { word } => println!("  ok       {word}"),
                        AlignmentOp::Wrong { expected, got } => {
                            println!("  wrong    {expected} -> {got}")
                        }
                        AlignmentOp::Missing { expected } => println!("  missing  {expected}"),
                        AlignmentOp::Extra { got } => println!("  extra    {got}"),
                    }
                }
                println!("Score: {}", report.score);
                log::debug!("main: report {}", serde_json::to_string(&report)?);
            }
            Err(e) => println!("Attempt failed: {e}"),
        }

        // Done / Error back to Idle for the next attempt.
        if let Outcome::Failed(e) = coach.take_outcome()? {
            log::debug!("main: cleared failed outcome: {e}");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("phono-coach starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads: the loop and blocking inference)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    // 4. Recognizer
    let recognizer = build_recognizer(&config);

    // 5. Coach
    let device = Arc::new(CpalDevice::new(config.audio.input_device.clone()));
    let coach = PracticeCoach::new(
        device,
        recognizer,
        MicrophoneLock::global(),
        config.coach_settings(),
    );

    // 6. Practice loop
    rt.block_on(run(coach, config))
}
