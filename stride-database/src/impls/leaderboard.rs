use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::cache::{LEADERBOARD_CACHE_TTL, invalidate_leaderboard, leaderboard_key};
use crate::database::Database;
use crate::model::scoring::LeaderboardEntry;

const ENTRY_SELECT: &str = r#"SELECT l.user_id AS "user", u.username, u.first_name, u.profile_image,
            l.total_score, l.weekly_score, l.monthly_score,
            l.total_rank, l.weekly_rank, l.monthly_rank, l.last_updated
     FROM leaderboards l
     JOIN users u ON u.id = l.user_id"#;

/// Every leaderboard row ordered by weekly rank.
pub async fn list_leaderboard(db: &Database) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let cache_key = leaderboard_key(db.cache());
    db.cache()
        .get_or_load_json(&cache_key, LEADERBOARD_CACHE_TTL, || async {
            let rows = sqlx::query_as::<_, LeaderboardEntry>(&format!(
                "{ENTRY_SELECT} ORDER BY l.weekly_rank ASC, l.user_id ASC"
            ))
            .fetch_all(db.pool())
            .await?;
            Ok(rows)
        })
        .await
}

pub async fn get_leaderboard_entry(
    db: &Database,
    user_id: i64,
) -> anyhow::Result<Option<LeaderboardEntry>> {
    let row = sqlx::query_as::<_, LeaderboardEntry>(&format!("{ENTRY_SELECT} WHERE l.user_id = $1"))
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;

    Ok(row)
}

#[derive(sqlx::FromRow)]
struct LedgerTotals {
    user_id: i64,
    total: i64,
    weekly: i64,
    monthly: i64,
}

/// Rank 1..=n by score descending; equal scores are ordered by user id so the
/// ranks always form a permutation.
pub fn assign_ranks(scores: &[(i64, i32)]) -> HashMap<i64, i32> {
    let mut ordered: Vec<(i64, i32)> = scores.to_vec();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ordered
        .into_iter()
        .zip(1..)
        .map(|((user_id, _), rank)| (user_id, rank))
        .collect()
}

/// Rebuild every user's buckets from the ledger and re-rank.
///
/// Weekly covers ledger rows since `week_start`, monthly since `month_start`.
pub async fn recompute_leaderboards(
    db: &Database,
    week_start: NaiveDate,
    month_start: NaiveDate,
) -> anyhow::Result<usize> {
    let week_start = week_start.and_time(NaiveTime::MIN).and_utc();
    let month_start = month_start.and_time(NaiveTime::MIN).and_utc();

    let mut tx = db.begin().await?;

    let rows = sqlx::query_as::<_, LedgerTotals>(
        "SELECT u.id AS user_id,
                COALESCE(SUM(s.score_value), 0)::BIGINT AS total,
                COALESCE(SUM(s.score_value) FILTER (WHERE s.timestamp >= $1), 0)::BIGINT AS weekly,
                COALESCE(SUM(s.score_value) FILTER (WHERE s.timestamp >= $2), 0)::BIGINT AS monthly
         FROM users u
         LEFT JOIN score_logs s ON s.user_id = u.id
         GROUP BY u.id
         ORDER BY u.id",
    )
    .bind(week_start)
    .bind(month_start)
    .fetch_all(&mut *tx)
    .await?;

    let mut totals = Vec::with_capacity(rows.len());
    for row in &rows {
        totals.push((
            row.user_id,
            i32::try_from(row.total).context("total score out of i32 range")?,
            i32::try_from(row.weekly).context("weekly score out of i32 range")?,
            i32::try_from(row.monthly).context("monthly score out of i32 range")?,
        ));
    }

    let total_ranks = assign_ranks(&totals.iter().map(|t| (t.0, t.1)).collect::<Vec<_>>());
    let weekly_ranks = assign_ranks(&totals.iter().map(|t| (t.0, t.2)).collect::<Vec<_>>());
    let monthly_ranks = assign_ranks(&totals.iter().map(|t| (t.0, t.3)).collect::<Vec<_>>());

    for (user_id, total, weekly, monthly) in &totals {
        sqlx::query(
            "INSERT INTO leaderboards
                 (user_id, total_score, weekly_score, monthly_score,
                  total_rank, weekly_rank, monthly_rank, last_updated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
             ON CONFLICT (user_id) DO UPDATE SET
                 total_score = EXCLUDED.total_score,
                 weekly_score = EXCLUDED.weekly_score,
                 monthly_score = EXCLUDED.monthly_score,
                 total_rank = EXCLUDED.total_rank,
                 weekly_rank = EXCLUDED.weekly_rank,
                 monthly_rank = EXCLUDED.monthly_rank,
                 last_updated = EXCLUDED.last_updated",
        )
        .bind(user_id)
        .bind(total)
        .bind(weekly)
        .bind(monthly)
        .bind(total_ranks.get(user_id).copied().unwrap_or_default())
        .bind(weekly_ranks.get(user_id).copied().unwrap_or_default())
        .bind(monthly_ranks.get(user_id).copied().unwrap_or_default())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    invalidate_leaderboard(db.cache()).await?;

    info!(users = totals.len(), "leaderboards recomputed");
    Ok(totals.len())
}

#[cfg(test)]
mod tests {
    use super::assign_ranks;

    #[test]
    fn ranks_follow_score_descending() {
        let ranks = assign_ranks(&[(1, 10), (2, 50), (3, 30)]);
        assert_eq!(ranks[&2], 1);
        assert_eq!(ranks[&3], 2);
        assert_eq!(ranks[&1], 3);
    }

    #[test]
    fn ties_break_by_user_id() {
        let ranks = assign_ranks(&[(9, 20), (4, 20), (7, 5)]);
        assert_eq!(ranks[&4], 1);
        assert_eq!(ranks[&9], 2);
        assert_eq!(ranks[&7], 3);
    }

    #[test]
    fn ranks_are_a_monotonic_permutation() {
        let scores = [(1, 0), (2, 15), (3, 15), (4, 100), (5, 3), (6, 0)];
        let ranks = assign_ranks(&scores);

        let mut seen: Vec<i32> = ranks.values().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=6).collect::<Vec<_>>());

        for (a_user, a_score) in scores {
            for (b_user, b_score) in scores {
                if a_score > b_score {
                    assert!(ranks[&a_user] < ranks[&b_user]);
                }
            }
        }
    }

    #[test]
    fn empty_input_has_no_ranks() {
        assert!(assign_ranks(&[]).is_empty());
    }
}
