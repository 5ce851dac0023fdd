use stride_database::Database;
use stride_database::impls::movement_stats::{
    owners_with_strength_data, recalc_movement_summaries,
};
use tracing::warn;

/// Recomputes every summary for every user with logged strength sets.
pub async fn run(db: &Database) -> anyhow::Result<usize> {
    let owners = owners_with_strength_data(db).await?;

    let mut updated = 0;
    for owner_id in owners {
        match recalc_movement_summaries(db, owner_id, None).await {
            Ok(count) => updated += count,
            Err(err) => warn!(owner_id, ?err, "movement summary recompute failed"),
        }
    }

    Ok(updated)
}
