//! Synthetic sensor feed example
//!
//! Run with: cargo run --example synthetic_feed [FRAMES]
//!
//! Wires a depth viewer and an infrared viewer into a session over the
//! synthetic device, pumps frames at sensor rate (~30 Hz), restarts the
//! session halfway through, and prints what each subscriber produced.
//!
//! ## Features
//!
//! - Fan-out: both subscribers receive their streams independently
//! - Colorization: raw 16-bit samples become displayable images per frame
//! - Lifecycle advisories: every state change is printed as it is published

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use depthcam_rs::color::{
    process_depth_frame, process_infrared_frame, DepthParams, RangeColorizer, SampleBuffer,
};
use depthcam_rs::device::{DeviceSession, SessionConfig, SyntheticConfig, SyntheticDevice};
use depthcam_rs::subscriber::{Subscriber, SubscriberRegistry};

const DEPTH_WIDTH: u32 = 64;
const DEPTH_HEIGHT: u32 = 48;

/// Builds one frame of a depth ramp that drifts over time
fn depth_ramp(frame_index: u64) -> Vec<u16> {
    let pixels = (DEPTH_WIDTH * DEPTH_HEIGHT) as usize;
    (0..pixels)
        .map(|i| 400 + ((i as u64 * 2 + frame_index * 25) % 4400) as u16)
        .collect()
}

/// Builds one frame of flat infrared intensity
fn ir_field(frame_index: u64) -> Vec<u16> {
    let pixels = (DEPTH_WIDTH * DEPTH_HEIGHT) as usize;
    vec![(frame_index * 997 % 50_000) as u16; pixels]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("depthcam_rs=debug".parse()?),
        )
        .init();

    let frames: u64 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(60);

    let device = SyntheticDevice::with_config(
        SyntheticConfig::default().depth_size(DEPTH_WIDTH, DEPTH_HEIGHT),
    );
    let handle = device.handle();

    let registry = Arc::new(SubscriberRegistry::new());
    let colorizer = Arc::new(RangeColorizer::default());

    // Depth viewer: colorizes every frame to a BGRX image.
    let depth_images = Arc::new(AtomicU64::new(0));
    {
        let colorizer = Arc::clone(&colorizer);
        let images = Arc::clone(&depth_images);
        let samples = Mutex::new(SampleBuffer::new());
        registry.insert(
            Subscriber::builder(registry.allocate_id(), "depth_viewer")
                .on_depth(move |frame| {
                    let mut samples = samples.lock().unwrap();
                    if let Some(image) = process_depth_frame(
                        &frame,
                        &mut samples,
                        &colorizer,
                        DepthParams::default(),
                    ) {
                        images.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(
                            width = image.width(),
                            height = image.height(),
                            "depth image produced"
                        );
                    }
                })
                .build(),
        );
    }

    // Infrared viewer.
    let ir_images = Arc::new(AtomicU64::new(0));
    {
        let colorizer = Arc::clone(&colorizer);
        let images = Arc::clone(&ir_images);
        let samples = Mutex::new(SampleBuffer::new());
        registry.insert(
            Subscriber::builder(registry.allocate_id(), "ir_viewer")
                .on_infrared(move |frame| {
                    let mut samples = samples.lock().unwrap();
                    if process_infrared_frame(&frame, &mut samples, &colorizer).is_some() {
                        images.fetch_add(1, Ordering::Relaxed);
                    }
                })
                .build(),
        );
    }

    let mut session = DeviceSession::new(
        Box::new(device),
        Arc::clone(&registry),
        SessionConfig::default(),
    );

    // Print advisories as they are published.
    let mut status_rx = session.status_subscribe();
    tokio::spawn(async move {
        while let Ok(message) = status_rx.recv().await {
            println!("[{}] {}", message.state, message.text);
        }
    });

    session.start().await?;
    println!(
        "Streaming {} frames at {}x{} (reliable depth {}..{} mm)",
        frames,
        DEPTH_WIDTH,
        DEPTH_HEIGHT,
        session.min_depth(),
        session.max_depth()
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(33));
    for frame_index in 0..frames {
        ticker.tick().await;

        handle.push_depth(&depth_ramp(frame_index));
        handle.push_infrared(&ir_field(frame_index));

        // Halfway through, tear the streams down and bring them back.
        if frame_index == frames / 2 {
            session.restart().await?;
        }
    }

    // Let the last callbacks drain before shutting down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.shutdown().await?;

    println!(
        "depth_viewer produced {} images, ir_viewer produced {}",
        depth_images.load(Ordering::Relaxed),
        ir_images.load(Ordering::Relaxed)
    );

    Ok(())
}
