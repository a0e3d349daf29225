mod detector;
mod preset;
mod source;

pub use detector::{Sample, ShakeConfig, ShakeDetector, ShakeHit, ShakePattern};
pub use preset::{SensitivityLevel, ThresholdPreset};
pub use source::{ReplaySource, SampleSource, ShakeMonitor};
