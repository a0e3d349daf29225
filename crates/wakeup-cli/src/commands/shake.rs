use clap::Subcommand;
use serde::Serialize;
use wakeup_core::alarm::Difficulty;
use wakeup_core::events::Event;
use wakeup_core::shake::{
    ReplaySource, Sample, SensitivityLevel, ShakeDetector, ShakeMonitor, ShakePattern,
};
use wakeup_core::storage::Config;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ShakeAction {
    /// Replay a synthetic shake stream through the detector
    Simulate {
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,
        /// Number of jolts to generate
        #[arg(long, default_value = "20")]
        jolts: u32,
        /// Milliseconds between jolts
        #[arg(long, default_value = "600")]
        spacing_ms: u64,
        /// Peak acceleration on the x axis
        #[arg(long, default_value = "20.0")]
        magnitude: f64,
        /// Detection threshold (clamped to the difficulty's range)
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[derive(Serialize)]
struct Simulation {
    difficulty: Difficulty,
    threshold: f64,
    sensitivity: SensitivityLevel,
    required_shakes: u32,
    shake_count: u32,
    completed: bool,
    intensity: f64,
    pattern: ShakePattern,
    events: Vec<Event>,
}

/// Jolts alternating in sign, so every step moves by twice `magnitude`.
fn jolts(count: u32, spacing_ms: u64, magnitude: f64) -> Vec<Sample> {
    (0..u64::from(count))
        .map(|i| {
            let x = if i % 2 == 0 { magnitude } else { -magnitude };
            Sample::new(x, 0.0, 0.0, i * spacing_ms)
        })
        .collect()
}

pub fn run(action: ShakeAction) -> CmdResult {
    let config = Config::load()?;

    match action {
        ShakeAction::Simulate {
            difficulty,
            jolts: count,
            spacing_ms,
            magnitude,
            threshold,
        } => {
            let mut detector = ShakeDetector::for_difficulty(difficulty, &config.shake);
            if let Some(requested) = threshold {
                detector.set_threshold(requested);
            }

            let source = ReplaySource::new(jolts(count, spacing_ms, magnitude));
            let mut monitor = ShakeMonitor::new(source, detector, config.shake.update_interval_ms);
            monitor.enable()?;
            monitor.poll();

            let events = monitor.drain_events();
            let detector = monitor.detector();
            let threshold = detector.threshold();
            let report = Simulation {
                difficulty,
                threshold,
                sensitivity: detector.preset().sensitivity_level(threshold),
                required_shakes: detector.required_shakes(),
                shake_count: detector.shake_count(),
                completed: monitor.is_complete(),
                intensity: detector.intensity(),
                pattern: detector.pattern(),
                events,
            };
            print_json(&report)?;
        }
    }
    Ok(())
}
