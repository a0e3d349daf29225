use std::time::Duration;

use clap::Subcommand;
use wakeup_core::alarm::{AlarmOptions, AlarmScheduler, Difficulty, SchedulerState, TriggerType};
use wakeup_core::notify::{
    dispatch, AlarmAudio, AlarmListener, SoundOutput, TriggerInfo, VibrationPattern,
};
use wakeup_core::storage::Config;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create (or replace) the alarm
    Set {
        /// Time of day, HH:MM
        time: String,
        /// easy, normal or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// shake, gps or both
        #[arg(long)]
        trigger: Option<TriggerType>,
        #[arg(long)]
        label: Option<String>,
    },
    /// Print the alarm status as JSON
    Status,
    /// Re-arm the stored alarm
    Enable,
    /// Disarm without deleting
    Disable,
    /// Cancel any pending or ringing alarm
    Cancel,
    /// Snooze the ringing alarm
    Snooze {
        /// Alarm id (defaults to the current alarm)
        #[arg(long)]
        id: Option<String>,
    },
    /// Dismiss the ringing alarm
    Complete {
        #[arg(long)]
        id: Option<String>,
    },
    /// Wait in the foreground until the alarm rings
    Run {
        /// Tick interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_ms: u64,
    },
}

/// Prints what the ringing alarm asks of the user.
struct Terminal;

impl AlarmListener for Terminal {
    fn on_triggered(&mut self, info: &TriggerInfo) {
        eprintln!(
            "Wake up! Shake {} times ({}) or run `wakeup alarm snooze`.",
            info.difficulty.required_shakes(),
            info.difficulty
        );
    }

    fn on_snoozed(&mut self, snooze_count: u32, penalty_amount: f64) {
        eprintln!("Snooze #{snooze_count}: penalty {penalty_amount:.2}");
    }
}

/// Terminal bell. Has no vibration motor.
struct Bell;

impl SoundOutput for Bell {
    fn play_alarm(&mut self, _sound_id: &str) -> Result<(), String> {
        eprint!("\x07");
        Ok(())
    }

    fn stop_alarm(&mut self) {}

    fn vibrate(&mut self, pattern: VibrationPattern, repeat: bool) {
        tracing::info!(
            "vibration requested ({} ms on, {} ms off, repeat {repeat})",
            pattern.on_ms,
            pattern.off_ms
        );
    }

    fn cancel_vibration(&mut self) {}
}

pub async fn run(action: AlarmAction, ctx: &Context) -> CmdResult {
    let config = Config::load()?;
    let mut scheduler = AlarmScheduler::new(ctx.store()?, ctx.clock(), config.alarm.clone());

    match action {
        AlarmAction::Set {
            time,
            difficulty,
            trigger,
            label,
        } => {
            let options = AlarmOptions {
                difficulty,
                trigger_type: trigger,
                label,
                sound_id: None,
            };
            scheduler.create_alarm(&time, options).await?;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Status => {
            scheduler.restore_schedule().await;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Enable => {
            scheduler.restore_schedule().await;
            scheduler.toggle(true).await?;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Disable => {
            scheduler.restore_schedule().await;
            scheduler.toggle(false).await?;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Cancel => {
            scheduler.restore_schedule().await;
            scheduler.cancel().await?;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Snooze { id } => {
            scheduler.restore_schedule().await;
            let id = alarm_id(&scheduler, id)?;
            let result = scheduler.handle_snooze(&id).await?;
            print_json(&result)?;
        }
        AlarmAction::Complete { id } => {
            scheduler.restore_schedule().await;
            let id = alarm_id(&scheduler, id)?;
            scheduler.complete_alarm(&id).await?;
            print_json(&scheduler.get_alarm_status())?;
        }
        AlarmAction::Run { poll_ms } => {
            scheduler.restore_schedule().await;
            let mut audio = AlarmAudio::new(Bell, config.vibration.pattern());
            let mut screen = Terminal;

            loop {
                scheduler.tick().await?;
                let events = scheduler.drain_events();
                for event in &events {
                    println!("{}", serde_json::to_string(event)?);
                }
                dispatch(&events, &mut screen, &mut audio);

                match scheduler.state() {
                    SchedulerState::Triggered | SchedulerState::Idle => break,
                    // A fixed --now never advances.
                    _ if ctx.now.is_some() => break,
                    _ => tokio::time::sleep(Duration::from_millis(poll_ms)).await,
                }
            }
        }
    }
    Ok(())
}

fn alarm_id(scheduler: &AlarmScheduler, id: Option<String>) -> Result<String, String> {
    id.or_else(|| scheduler.alarm().map(|a| a.id.clone()))
        .ok_or_else(|| "no alarm configured".to_string())
}
