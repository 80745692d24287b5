//! Application state for the conversion API

use bankpdf_core::StatementEngine;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub engine: StatementEngine,
    pub usage: UsageCounters,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            engine: StatementEngine::new(),
            usage: UsageCounters::new(),
        }
    }
}

/// Counter values as reported by `/stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub conversions_today: u64,
    pub ocr_calls_today: u64,
}

#[derive(Debug)]
struct Counters {
    day: NaiveDate,
    usage: UsageSnapshot,
}

impl Counters {
    /// Reset when the calendar day has moved on
    fn roll_to(&mut self, day: NaiveDate) {
        if day != self.day {
            self.day = day;
            self.usage = UsageSnapshot::default();
        }
    }
}

/// Per-day request counters, reset at UTC midnight
#[derive(Debug)]
pub struct UsageCounters {
    inner: Mutex<Counters>,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::starting_on(today())
    }

    pub fn starting_on(day: NaiveDate) -> Self {
        Self {
            inner: Mutex::new(Counters {
                day,
                usage: UsageSnapshot::default(),
            }),
        }
    }

    pub fn record_conversion(&self) {
        self.record_conversion_on(today());
    }

    pub fn record_conversion_on(&self, day: NaiveDate) {
        let mut counters = self.lock();
        counters.roll_to(day);
        counters.usage.conversions_today += 1;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.snapshot_on(today())
    }

    pub fn snapshot_on(&self, day: NaiveDate) -> UsageSnapshot {
        let mut counters = self.lock();
        counters.roll_to(day);
        counters.usage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
