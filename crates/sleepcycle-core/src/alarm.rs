//! Hand-off of a chosen time to the device alarm, plus the history record.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cycle::{Candidate, CycleScheduler};
use crate::error::AlarmError;
use crate::i18n::{keys, Localizer};
use crate::store::{SleepEvent, SleepEventStore, SleepType};
use crate::time::alarm_time_label;

/// What the platform is asked to ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRequest {
    pub hour: u32,
    pub minute: u32,
    pub message: String,
}

/// The device's alarm clock.
#[async_trait]
pub trait AlarmPlatform: Send + Sync {
    async fn schedule(&self, request: &AlarmRequest) -> Result<(), AlarmError>;
}

/// Transient confirmation shown after a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: &Toast);
}

/// Result of one scheduling action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmReceipt {
    /// Id of the recorded [`SleepEvent`].
    pub sleep_id: i64,
    pub request: AlarmRequest,
    /// Whether the platform accepted the alarm.
    pub registered: bool,
}

/// Schedules alarms and records each one in the sleep history.
pub struct AlarmGateway {
    platform: Arc<dyn AlarmPlatform>,
    notifier: Arc<dyn Notifier>,
    localizer: Arc<dyn Localizer>,
    sleeps: Arc<SleepEventStore>,
}

impl AlarmGateway {
    pub fn new(
        platform: Arc<dyn AlarmPlatform>,
        notifier: Arc<dyn Notifier>,
        localizer: Arc<dyn Localizer>,
        sleeps: Arc<SleepEventStore>,
    ) -> Self {
        Self {
            platform,
            notifier,
            localizer,
            sleeps,
        }
    }

    /// Ask the platform for an alarm at the wall-clock time of `at` and
    /// record the sleep.
    ///
    /// The record is written whether or not the platform accepts; the
    /// confirmation toast only follows an accepted registration. A zero
    /// cycle count is stored as absent.
    pub async fn create_intent_alarm<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
        sleep_type: Option<SleepType>,
        cycles: Option<u32>,
    ) -> AlarmReceipt {
        let sleep_type = sleep_type.unwrap_or(SleepType::Sleep);
        let message_key = match sleep_type {
            SleepType::Sleep => keys::ALARM_SLEEP,
            SleepType::PowerNap => keys::ALARM_POWERNAP,
        };
        let request = AlarmRequest {
            hour: at.hour(),
            minute: at.minute(),
            message: self.localizer.translate(message_key, &[]),
        };
        let event = SleepEvent::new(sleep_type, Utc::now(), at.with_timezone(&Utc))
            .with_cycle(cycles.filter(|c| *c != 0));

        let (registration, sleep_id) =
            tokio::join!(self.platform.schedule(&request), self.sleeps.add_sleep(event));

        let registered = match registration {
            Ok(()) => {
                let label = alarm_time_label(at);
                info!(time = %label, %sleep_type, "alarm registered");
                self.notifier.notify(&Toast {
                    title: self.localizer.translate(keys::ALARM_SET, &[]),
                    body: self
                        .localizer
                        .translate(keys::ALARM_SET_FOR, &[("time", label.as_str())]),
                });
                true
            }
            Err(e) => {
                error!(error = %e, "alarm registration failed");
                false
            }
        };

        AlarmReceipt {
            sleep_id,
            request,
            registered,
        }
    }

    /// Schedule a cycle candidate as a sleep alarm.
    pub async fn schedule<Tz: TimeZone>(&self, candidate: &Candidate<Tz>) -> AlarmReceipt {
        self.create_intent_alarm(&candidate.at, Some(SleepType::Sleep), Some(candidate.cycles))
            .await
    }

    /// One cycle from `now`.
    pub async fn sleep_now<Tz>(&self, scheduler: &CycleScheduler, now: &DateTime<Tz>) -> AlarmReceipt
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.schedule(&scheduler.sleep_now(now)).await
    }

    /// A power nap starting `now`.
    pub async fn power_nap<Tz: TimeZone>(
        &self,
        scheduler: &CycleScheduler,
        now: &DateTime<Tz>,
    ) -> AlarmReceipt {
        let end = scheduler.power_nap(now);
        self.create_intent_alarm(&end, Some(SleepType::PowerNap), None)
            .await
    }
}
