// scheduler.rs - Periodic deadline reminder runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tt_workflow::{DeadlineReminder, ReminderReport};

/// Run the reminder once on the blocking pool.
pub async fn remind_once(reminder: Arc<DeadlineReminder>) -> anyhow::Result<ReminderReport> {
    let report = tokio::task::spawn_blocking(move || reminder.run()).await??;
    Ok(report)
}

/// Run the reminder every `every`, starting one period from now. Failed
/// runs are logged and the loop carries on.
pub async fn run_reminders(reminder: Arc<DeadlineReminder>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match remind_once(reminder.clone()).await {
            Ok(report) => tracing::info!(
                upcoming = report.upcoming.len(),
                sent = report.reminders_sent,
                "scheduled reminder run finished"
            ),
            Err(e) => tracing::error!(error = %e, "scheduled reminder run failed"),
        }
    }
}
