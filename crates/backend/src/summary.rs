use shared::domain::EngagementSummary;
use storage::StoredEngagementLog;

const MAX_ENGAGEMENT_SCORE: i64 = 100;
const SECONDS_PER_ACTION: i64 = 30;

/// Aggregates over the logs matching a query.
///
/// `active_users` counts matching rows, `engagement_score` is the action total
/// capped at 100 and `avg_session_time` assumes half a minute per action.
pub fn summarize(logs: &[StoredEngagementLog]) -> EngagementSummary {
    let total_actions: i64 = logs.iter().map(|log| log.actions).sum();

    let mut summary = EngagementSummary::default();
    summary.insert("active_users", logs.len() as i64);
    summary.insert(
        "engagement_score",
        total_actions.clamp(0, MAX_ENGAGEMENT_SCORE),
    );
    summary.insert("avg_session_time", format_session_time(total_actions));
    summary
}

fn format_session_time(total_actions: i64) -> String {
    let seconds = total_actions.max(0) * SECONDS_PER_ACTION;
    format!("{}m {}s", seconds / 60, seconds % 60)
}
