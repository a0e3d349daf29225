use serde::{Deserialize, Serialize};

/// On/off vibration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern {
    pub on_ms: u64,
    pub off_ms: u64,
}

impl VibrationPattern {
    pub fn new(on_ms: u64, off_ms: u64) -> Self {
        Self { on_ms, off_ms }
    }

    pub fn cycle_ms(&self) -> u64 {
        self.on_ms + self.off_ms
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self::new(1000, 500)
    }
}

/// Device audio and haptics.
pub trait SoundOutput {
    fn play_alarm(&mut self, sound_id: &str) -> Result<(), String>;

    fn stop_alarm(&mut self);

    fn vibrate(&mut self, pattern: VibrationPattern, repeat: bool);

    fn cancel_vibration(&mut self);
}

/// Output that records what it was asked to do and never fails.
#[derive(Debug, Default)]
pub struct NullSound {
    pub playing: Option<String>,
}

impl SoundOutput for NullSound {
    fn play_alarm(&mut self, sound_id: &str) -> Result<(), String> {
        self.playing = Some(sound_id.to_string());
        Ok(())
    }

    fn stop_alarm(&mut self) {
        self.playing = None;
    }

    fn vibrate(&mut self, _pattern: VibrationPattern, _repeat: bool) {}

    fn cancel_vibration(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioState {
    Silent,
    Playing,
    Vibrating,
}

/// Audio collaborator facade.
///
/// If the alarm sound cannot be played, a repeating vibration starts
/// instead and keeps going until [`request_stop_alarm_sound`] is called.
///
/// [`request_stop_alarm_sound`]: AlarmAudio::request_stop_alarm_sound
pub struct AlarmAudio<S: SoundOutput> {
    output: S,
    fallback: VibrationPattern,
    state: AudioState,
}

impl<S: SoundOutput> AlarmAudio<S> {
    pub fn new(output: S, fallback: VibrationPattern) -> Self {
        Self {
            output,
            fallback,
            state: AudioState::Silent,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn output(&self) -> &S {
        &self.output
    }

    pub fn request_play_alarm_sound(&mut self, sound_id: &str) {
        if self.state != AudioState::Silent {
            return;
        }
        match self.output.play_alarm(sound_id) {
            Ok(()) => {
                tracing::info!("alarm sound '{sound_id}' playing");
                self.state = AudioState::Playing;
            }
            Err(e) => {
                tracing::warn!("alarm sound failed ({e}), falling back to vibration");
                self.output.vibrate(self.fallback, true);
                self.state = AudioState::Vibrating;
            }
        }
    }

    /// Stops sound and vibration. Safe to call in any state.
    pub fn request_stop_alarm_sound(&mut self) {
        match self.state {
            AudioState::Playing => self.output.stop_alarm(),
            AudioState::Vibrating => self.output.cancel_vibration(),
            AudioState::Silent => return,
        }
        self.state = AudioState::Silent;
    }
}
