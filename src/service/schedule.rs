//! Decides whether a live rate fetch is due.
//!
//! Live fetches are allowed once in a one-hour morning window and once in a
//! one-hour evening window, up to a daily ceiling. The gate keeps no state:
//! it reads the clock and today's [`UsageRecord`] and only the caller's
//! later usage increment moves anything forward.

use super::usage::{UsageRecord, day_of};
use crate::core::config::ScheduleConfig;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Timelike};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Morning,
    Evening,
}

impl Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Window::Morning => "morning",
                Window::Evening => "evening",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    DailyLimitReached { count: u32, max: u32 },
    NotScheduledTime,
    AlreadyUpdated(Window),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow {
        window: Window,
        hour: u32,
    },
    Deny {
        reason: DenyReason,
        next_window: Option<DateTime<FixedOffset>>,
    },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow { .. })
    }
}

impl Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Allow { window, hour } => {
                write!(f, "scheduled {window} update ({hour:02}:00 window)")
            }
            GateDecision::Deny {
                reason,
                next_window,
            } => {
                match reason {
                    DenyReason::DailyLimitReached { count, max } => {
                        write!(f, "daily limit reached ({count}/{max} live updates used)")?
                    }
                    DenyReason::NotScheduledTime => write!(f, "not scheduled time")?,
                    DenyReason::AlreadyUpdated(window) => {
                        write!(f, "already updated in this {window} window")?
                    }
                }
                if let Some(next) = next_window {
                    write!(f, "; next update window opens {}", next.format("%d %b %H:%M"))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleGate {
    morning_hour: u32,
    evening_hour: u32,
    max_daily_requests: u32,
}

impl Default for ScheduleGate {
    fn default() -> Self {
        Self::new(&ScheduleConfig::default())
    }
}

impl ScheduleGate {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            morning_hour: config.morning_hour,
            evening_hour: config.evening_hour,
            max_daily_requests: config.max_daily_requests,
        }
    }

    pub fn max_daily_requests(&self) -> u32 {
        self.max_daily_requests
    }

    fn window_of(&self, hour: u32) -> Option<Window> {
        if hour == self.morning_hour {
            Some(Window::Morning)
        } else if hour == self.evening_hour {
            Some(Window::Evening)
        } else {
            None
        }
    }

    pub fn check(&self, now: DateTime<FixedOffset>, usage: &UsageRecord) -> GateDecision {
        if usage.count >= self.max_daily_requests {
            return GateDecision::Deny {
                reason: DenyReason::DailyLimitReached {
                    count: usage.count,
                    max: self.max_daily_requests,
                },
                next_window: self.tomorrow_morning(now),
            };
        }

        let hour = now.hour();
        let Some(window) = self.window_of(hour) else {
            return GateDecision::Deny {
                reason: DenyReason::NotScheduledTime,
                next_window: self.next_window_start(now),
            };
        };

        let called_this_window = usage.last_call.is_some_and(|last| {
            let last = last.with_timezone(now.offset());
            day_of(last) == day_of(now) && self.window_of(last.hour()) == Some(window)
        });
        if called_this_window {
            return GateDecision::Deny {
                reason: DenyReason::AlreadyUpdated(window),
                next_window: self.next_window_start(now),
            };
        }

        GateDecision::Allow { window, hour }
    }

    /// Start of the next window strictly after the current hour.
    pub fn next_window_start(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let hour = now.hour();
        if hour < self.morning_hour {
            at_hour(now.date_naive(), self.morning_hour, now.offset())
        } else if hour < self.evening_hour {
            at_hour(now.date_naive(), self.evening_hour, now.offset())
        } else {
            self.tomorrow_morning(now)
        }
    }

    fn tomorrow_morning(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let tomorrow = now.date_naive().checked_add_days(Days::new(1))?;
        at_hour(tomorrow, self.morning_hour, now.offset())
    }
}

fn at_hour(day: NaiveDate, hour: u32, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    day.and_hms_opt(hour, 0, 0)?
        .and_local_timezone(*offset)
        .single()
}
