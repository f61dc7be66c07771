use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tandem::context::PlatformContext;
use tandem::engine::sim::{SimulatedEffectEngine, SimulatedMediaEngine};
use tandem::engine::{EffectSource, MediaEvent, MediaSource};
use tandem::{ControllerError, ControllerEvent, Engines, PlaybackController, PlayerConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_DURATION: Duration = Duration::from_secs(6);
const DEMO_EFFECT: &[u8] = br#"{"Metadata":{"Version":2},"PatternList":[]}"#;

/// What the user does in the scripted demo session
#[derive(Debug)]
enum Intent {
    Toggle,
    Seek(f64),
    RateBar(u8),
}

fn script() -> Vec<(Duration, Intent)> {
    vec![
        (Duration::ZERO, Intent::Toggle),
        (Duration::from_millis(1000), Intent::Seek(0.5)),
        (Duration::from_millis(500), Intent::Toggle),
        // 2.0x while paused; the session must stay paused
        (Duration::from_millis(500), Intent::RateBar(60)),
        (Duration::from_millis(500), Intent::Toggle),
    ]
}

fn apply(controller: &mut PlaybackController, intent: Intent) -> Result<(), ControllerError> {
    info!("User: {:?}", intent);
    match intent {
        Intent::Toggle => controller.toggle(),
        Intent::Seek(fraction) => controller.seek_to(fraction),
        Intent::RateBar(percent) => {
            controller.preview_rate_bar(percent);
            controller.set_rate_from_bar(percent)
        }
    }
}

async fn run(config: PlayerConfig) -> Result<()> {
    let context = PlatformContext::from_data_dir()
        .unwrap_or_else(|| PlatformContext::new(std::env::temp_dir().join("tandem")));
    let effect_path = context.stage_asset("demo.he", DEMO_EFFECT)?;
    info!("Effect staged in {}", context.storage_dir().display());

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let engines = Engines {
        media: Box::new(SimulatedMediaEngine::new(DEMO_DURATION)),
        effect: Box::new(SimulatedEffectEngine::new()),
        probe: Arc::new(|_: &MediaSource| Some(DEMO_DURATION)),
    };
    let mut controller = PlaybackController::new(
        engines,
        MediaSource::new("sim://demo"),
        EffectSource::new(effect_path),
        &config,
        events_tx,
    )?;

    // Stand-in for the UI: feeds user intents to the owner loop
    let (intent_tx, mut intents) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for (delay, intent) in script() {
            tokio::time::sleep(delay).await;
            if intent_tx.send(intent).is_err() {
                break;
            }
        }
    });

    let mut last_progress = None;
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let completed = matches!(
                    event,
                    ControllerEvent::Media { session, event: MediaEvent::Completed }
                        if session == controller.session_id()
                );
                controller.handle_event(event);

                let view = controller.display();
                if last_progress != Some(view.progress_percent) {
                    last_progress = Some(view.progress_percent);
                    info!(
                        "[{}] {} / {} ({}%) at {}",
                        view.transport_label,
                        view.elapsed_text,
                        view.duration_text,
                        view.progress_percent,
                        view.rate_text
                    );
                }
                if completed {
                    info!("Playback completed, session re-armed: {}", controller.state());
                    break;
                }
            }
            Some(intent) = intents.recv() => {
                if let Err(e) = apply(&mut controller, intent) {
                    warn!("{}", e);
                }
            }
            else => break,
        }
    }

    controller.teardown();
    Ok(())
}

fn main() -> Result<()> {
    let config = PlayerConfig::load();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // First run: write the defaults out so they can be edited
    if PlayerConfig::config_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = config.save() {
            warn!("Failed to save default settings: {:#}", e);
        }
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(run(config))
}
