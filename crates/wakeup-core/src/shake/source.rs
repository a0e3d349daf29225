//! Accelerometer subscription handling.

use tokio::sync::mpsc::{self, error::TryRecvError, Receiver};

use super::detector::{Sample, ShakeDetector};
use crate::error::SensorError;
use crate::events::Event;

/// Push stream of accelerometer samples.
pub trait SampleSource: Send {
    fn is_available(&self) -> bool;

    /// Open a subscription delivering samples roughly every `interval_ms`.
    fn subscribe(&mut self, interval_ms: u64) -> Result<Receiver<Sample>, SensorError>;
}

/// Source that replays a fixed list of samples, then closes.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    samples: Vec<Sample>,
    available: bool,
}

impl ReplaySource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            available: true,
        }
    }

    /// A device without an accelerometer.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl SampleSource for ReplaySource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn subscribe(&mut self, _interval_ms: u64) -> Result<Receiver<Sample>, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }
        let (tx, rx) = mpsc::channel(self.samples.len().max(1));
        for sample in &self.samples {
            tx.try_send(*sample)
                .map_err(|e| SensorError::SubscriptionFailed(e.to_string()))?;
        }
        Ok(rx)
    }
}

/// Owns the sample subscription and feeds it through a [`ShakeDetector`],
/// emitting `ShakeProgress` / `ShakeCompleted` events.
///
/// Samples are consumed from a single context: `poll` drains whatever is
/// queued, `feed` accepts a sample pushed directly.
pub struct ShakeMonitor<S: SampleSource> {
    source: S,
    detector: ShakeDetector,
    update_interval_ms: u64,
    subscription: Option<Receiver<Sample>>,
    completed: bool,
    outbox: Vec<Event>,
}

impl<S: SampleSource> ShakeMonitor<S> {
    pub fn new(source: S, detector: ShakeDetector, update_interval_ms: u64) -> Self {
        Self {
            source,
            detector,
            update_interval_ms,
            subscription: None,
            completed: false,
            outbox: Vec::new(),
        }
    }

    /// Start listening. Already enabled is a no-op. If the sensor is missing
    /// the monitor stays disabled and the error is returned so the caller
    /// can offer the manual fallback.
    pub fn enable(&mut self) -> Result<(), SensorError> {
        if self.subscription.is_some() {
            return Ok(());
        }
        if !self.source.is_available() {
            tracing::warn!("accelerometer unavailable, shake detection disabled");
            return Err(SensorError::Unavailable);
        }
        match self.source.subscribe(self.update_interval_ms) {
            Ok(rx) => {
                tracing::info!("shake detection started");
                self.subscription = Some(rx);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("shake detection not started: {e}");
                Err(e)
            }
        }
    }

    /// Release the subscription. Safe to call repeatedly.
    pub fn disable(&mut self) {
        if self.subscription.take().is_some() {
            tracing::info!("shake detection stopped");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    /// Process every queued sample. Returns how many were consumed.
    /// A closed stream releases the subscription.
    pub fn poll(&mut self) -> usize {
        let mut consumed = 0;
        loop {
            let Some(rx) = self.subscription.as_mut() else {
                break;
            };
            match rx.try_recv() {
                Ok(sample) => {
                    consumed += 1;
                    self.feed(sample);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("sample stream closed");
                    self.subscription = None;
                    break;
                }
            }
        }
        consumed
    }

    /// Process a single sample. Ignored while disabled.
    pub fn feed(&mut self, sample: Sample) {
        if self.subscription.is_none() {
            return;
        }
        let Some(hit) = self.detector.process(sample) else {
            return;
        };

        self.outbox.push(Event::ShakeProgress {
            count: hit.count,
            required: self.detector.required_shakes(),
            intensity: hit.delta,
            pattern: self.detector.pattern(),
        });
        if hit.completed && !self.completed {
            self.completed = true;
            self.outbox.push(Event::ShakeCompleted {
                count: hit.count,
                intensity: self.detector.intensity(),
            });
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn detector(&self) -> &ShakeDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut ShakeDetector {
        &mut self.detector
    }

    /// Start a fresh challenge.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.completed = false;
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }
}

impl<S: SampleSource> Drop for ShakeMonitor<S> {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::Difficulty;
    use crate::storage::ShakeSettings;

    fn jolts(n: u64) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let x = if i % 2 == 0 { 20.0 } else { -20.0 };
                Sample::new(x, 0.0, 0.0, i * 600)
            })
            .collect()
    }

    fn monitor(source: ReplaySource) -> ShakeMonitor<ReplaySource> {
        let detector = ShakeDetector::for_difficulty(Difficulty::Easy, &ShakeSettings::default());
        ShakeMonitor::new(source, detector, 100)
    }

    #[test]
    fn replay_reaches_completion_once() {
        let mut m = monitor(ReplaySource::new(jolts(12)));
        m.enable().unwrap();
        assert_eq!(m.poll(), 12);

        let events = m.drain_events();
        let progress = events
            .iter()
            .filter(|e| matches!(e, Event::ShakeProgress { .. }))
            .count();
        let completed = events
            .iter()
            .filter(|e| matches!(e, Event::ShakeCompleted { .. }))
            .count();
        assert_eq!(progress, 12);
        assert_eq!(completed, 1);
        assert!(m.is_complete());
        // Stream ended, subscription released.
        assert!(!m.is_enabled());
    }

    #[test]
    fn unavailable_sensor_stays_disabled() {
        let mut m = monitor(ReplaySource::unavailable());
        assert_eq!(m.enable(), Err(SensorError::Unavailable));
        assert!(!m.is_enabled());
        m.feed(Sample::new(50.0, 0.0, 0.0, 0));
        assert!(m.drain_events().is_empty());
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut m = monitor(ReplaySource::new(jolts(3)));
        m.enable().unwrap();
        m.enable().unwrap();
        m.disable();
        m.disable();
        assert!(!m.is_enabled());
        assert_eq!(m.poll(), 0);
        assert_eq!(m.detector().shake_count(), 0);
    }
}
