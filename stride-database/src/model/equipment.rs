use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::catalog::Equipment;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedEquipmentFilter {
    pub id: i64,
    pub filter_name: String,
    #[serde(rename = "owner")]
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub equipment: Vec<Equipment>,
}
