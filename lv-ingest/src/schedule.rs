//! Daily trigger times
//!
//! [`DailySchedule::next_run_after`] is a pure function of the current time,
//! so when a job fires can be tested without waiting for a clock.
//! [`spawn_daily`] is the thin in-process loop built on top of it; an
//! external scheduler can instead invoke the `lv-ingest` commands directly.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use lv_common::config::ScheduleConfig;
use lv_common::{Error, Result};
use rand::Rng;
use std::future::Future;
use tokio::task::JoinHandle;

/// Once a day at a local wall-clock time, plus optional random delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    offset: FixedOffset,
    max_jitter: Duration,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, utc_offset_minutes: i32, max_jitter_minutes: u32) -> Result<Self> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Config(format!(
                    "schedule.utc_offset_minutes out of range: {}",
                    utc_offset_minutes
                ))
            })?;
        Ok(Self {
            at,
            offset,
            max_jitter: Duration::minutes(i64::from(max_jitter_minutes)),
        })
    }

    /// Crawl trigger from `[schedule]`
    pub fn crawl(config: &ScheduleConfig) -> Result<Self> {
        Self::new(
            config.crawl_time()?,
            config.utc_offset_minutes,
            config.crawl_jitter_minutes,
        )
    }

    /// Reconcile trigger from `[schedule]` (never jittered)
    pub fn reconcile(config: &ScheduleConfig) -> Result<Self> {
        Self::new(config.reconcile_time()?, config.utc_offset_minutes, 0)
    }

    /// First scheduled instant strictly after `now`, before jitter
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveTime, TimeZone, Utc};
    /// use lv_ingest::schedule::DailySchedule;
    ///
    /// // 06:00 in UTC+05:30 is 00:30 UTC
    /// let schedule = DailySchedule::new(NaiveTime::from_hms_opt(6, 0, 0).unwrap(), 330, 0).unwrap();
    /// let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    /// assert_eq!(
    ///     schedule.next_run_after(now),
    ///     Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap()
    /// );
    /// ```
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.offset).naive_local();
        let mut candidate = local_now.date().and_time(self.at);
        if candidate <= local_now {
            candidate += Duration::days(1);
        }
        let utc = candidate - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// Random delay in `[0, max_jitter]`
    pub fn sample_jitter(&self) -> Duration {
        let max = self.max_jitter.num_seconds();
        if max <= 0 {
            return Duration::zero();
        }
        Duration::seconds(rand::thread_rng().gen_range(0..=max))
    }
}

/// Run `job` every day on `schedule` until the task is aborted
pub fn spawn_daily<F, Fut>(name: &'static str, schedule: DailySchedule, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = schedule.next_run_after(now) + schedule.sample_jitter();
            tracing::info!(job = name, next_run = %next, "Next scheduled run");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            tracing::info!(job = name, "Scheduled run starting");
            job().await;
        }
    })
}
