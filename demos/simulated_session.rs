//! Streams a simulated headset into a gesture service and prints what fires
//!
//! Run with `RUST_LOG=gesture_core=debug` for more detail.

use gesture_core::hal::SampleSink;
use gesture_core::{
    ConfigLoader, GestureKind, GestureService, SimulatedHeadset, SimulatorConfig,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_core=info".into()),
        )
        .init();

    let service = Arc::new(GestureService::from_loader(&ConfigLoader::new())?);
    info!(config = %service.config().summary(), "configuration loaded");

    service.on_blink(|event| println!("blink       @ {:>6} ms", event.fired_at_nanos / 1_000_000));
    service.on_jaw_clench(|event| println!("jaw clench  @ {:>6} ms", event.fired_at_nanos / 1_000_000));

    service.start()?;

    // ~220 Hz headset with 12-sample notifications
    let headset = SimulatedHeadset::new(SimulatorConfig::default())?;
    let sink: Arc<dyn SampleSink> = service.clone();
    let mut stream = headset.spawn(sink, Duration::from_millis(55))?;

    let script = [
        GestureKind::Blink,
        GestureKind::JawClench,
        GestureKind::Blink,
        GestureKind::Blink,
        GestureKind::JawClench,
    ];
    for kind in script {
        thread::sleep(Duration::from_millis(1_500));
        info!(%kind, "injecting");
        stream.inject(kind);
    }
    thread::sleep(Duration::from_millis(1_000));

    stream.stop();
    service.stop();

    let stats = service.stats();
    println!(
        "done: {} rounds streamed, {} events dispatched",
        stream.rounds(),
        stats.dispatch.events_dispatched
    );
    Ok(())
}
