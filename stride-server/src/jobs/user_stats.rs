use stride_database::Database;
use stride_database::impls::user_stats::recompute_all_user_stats;
use stride_utils::time::today_utc;

pub async fn run(db: &Database) -> anyhow::Result<usize> {
    recompute_all_user_stats(db, today_utc()).await
}
