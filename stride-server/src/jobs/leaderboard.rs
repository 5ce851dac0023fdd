use stride_database::Database;
use stride_database::impls::leaderboard::recompute_leaderboards;
use stride_utils::time::{days_before, start_of_month, today_utc};

/// Rebuilds weekly, monthly and total scores from the ledger and re-ranks everyone.
pub async fn run(db: &Database) -> anyhow::Result<usize> {
    let today = today_utc();
    recompute_leaderboards(db, days_before(today, 7), start_of_month(today)).await
}
