use sqlx::PgConnection;

use crate::database::Database;
use crate::impls::catalog::group_by;
use crate::model::catalog::Equipment;
use crate::model::equipment::SavedEquipmentFilter;

#[derive(Clone, Debug)]
pub enum FilterOutcome {
    Saved(SavedEquipmentFilter),
    DuplicateName,
    NotFound,
}

#[derive(sqlx::FromRow)]
struct FilterEquipmentRow {
    filter_id: i64,
    id: i64,
    equipment_name: String,
}

async fn name_in_use(
    conn: &mut PgConnection,
    owner_id: i64,
    name: &str,
    except_id: Option<i64>,
) -> anyhow::Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM saved_equipment_filters
             WHERE owner_id = $1 AND filter_name = $2 AND ($3::BIGINT IS NULL OR id <> $3)
         )",
    )
    .bind(owner_id)
    .bind(name)
    .bind(except_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(taken)
}

/// Replace a filter's equipment with the named items; unknown names are ignored.
async fn set_filter_equipment(
    conn: &mut PgConnection,
    filter_id: i64,
    equipment_names: &[String],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM saved_equipment_filter_items WHERE filter_id = $1")
        .bind(filter_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO saved_equipment_filter_items (filter_id, equipment_id)
         SELECT $1, id FROM equipment WHERE equipment_name = ANY($2)
         ON CONFLICT DO NOTHING",
    )
    .bind(filter_id)
    .bind(equipment_names)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn attach_equipment(
    db: &Database,
    mut filters: Vec<SavedEquipmentFilter>,
) -> anyhow::Result<Vec<SavedEquipmentFilter>> {
    let ids: Vec<i64> = filters.iter().map(|filter| filter.id).collect();
    let rows = sqlx::query_as::<_, FilterEquipmentRow>(
        "SELECT i.filter_id, e.id, e.equipment_name
         FROM saved_equipment_filter_items i
         JOIN equipment e ON e.id = i.equipment_id
         WHERE i.filter_id = ANY($1)
         ORDER BY e.equipment_name",
    )
    .bind(&ids)
    .fetch_all(db.pool())
    .await?;

    let mut grouped = group_by(rows, |row| Some(row.filter_id));
    for filter in &mut filters {
        filter.equipment = grouped
            .remove(&filter.id)
            .unwrap_or_default()
            .into_iter()
            .map(|row| Equipment {
                id: row.id,
                equipment_name: row.equipment_name,
            })
            .collect();
    }

    Ok(filters)
}

pub async fn list_filters(db: &Database, owner_id: i64) -> anyhow::Result<Vec<SavedEquipmentFilter>> {
    let filters = sqlx::query_as::<_, SavedEquipmentFilter>(
        "SELECT id, filter_name, owner_id, created_at
         FROM saved_equipment_filters WHERE owner_id = $1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    attach_equipment(db, filters).await
}

pub async fn find_filter(
    db: &Database,
    filter_id: i64,
    owner_id: i64,
) -> anyhow::Result<Option<SavedEquipmentFilter>> {
    let filter = sqlx::query_as::<_, SavedEquipmentFilter>(
        "SELECT id, filter_name, owner_id, created_at
         FROM saved_equipment_filters WHERE id = $1 AND owner_id = $2",
    )
    .bind(filter_id)
    .bind(owner_id)
    .fetch_optional(db.pool())
    .await?;

    match filter {
        Some(filter) => Ok(attach_equipment(db, vec![filter]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn create_filter(
    db: &Database,
    owner_id: i64,
    name: &str,
    equipment_names: &[String],
) -> anyhow::Result<FilterOutcome> {
    let mut tx = db.begin().await?;

    if name_in_use(&mut *tx, owner_id, name, None).await? {
        return Ok(FilterOutcome::DuplicateName);
    }

    let filter_id: i64 = sqlx::query_scalar(
        "INSERT INTO saved_equipment_filters (owner_id, filter_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(owner_id)
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    set_filter_equipment(&mut *tx, filter_id, equipment_names).await?;
    tx.commit().await?;

    match find_filter(db, filter_id, owner_id).await? {
        Some(filter) => Ok(FilterOutcome::Saved(filter)),
        None => Ok(FilterOutcome::NotFound),
    }
}

/// Rename and/or replace equipment; `None` keeps the current value.
pub async fn update_filter(
    db: &Database,
    filter_id: i64,
    owner_id: i64,
    name: Option<&str>,
    equipment_names: Option<&[String]>,
) -> anyhow::Result<FilterOutcome> {
    let mut tx = db.begin().await?;

    let locked: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM saved_equipment_filters WHERE id = $1 AND owner_id = $2 FOR UPDATE",
    )
    .bind(filter_id)
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Ok(FilterOutcome::NotFound);
    }

    if let Some(name) = name {
        if name_in_use(&mut *tx, owner_id, name, Some(filter_id)).await? {
            return Ok(FilterOutcome::DuplicateName);
        }
        sqlx::query("UPDATE saved_equipment_filters SET filter_name = $2 WHERE id = $1")
            .bind(filter_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(equipment_names) = equipment_names {
        set_filter_equipment(&mut *tx, filter_id, equipment_names).await?;
    }

    tx.commit().await?;

    match find_filter(db, filter_id, owner_id).await? {
        Some(filter) => Ok(FilterOutcome::Saved(filter)),
        None => Ok(FilterOutcome::NotFound),
    }
}

pub async fn delete_filter(db: &Database, filter_id: i64, owner_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM saved_equipment_filters WHERE id = $1 AND owner_id = $2")
        .bind(filter_id)
        .bind(owner_id)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}
