use serde::Serialize;
use sqlx::FromRow;

/// Server-side mirror of a savings goal. The backend stores and serves
/// these as plain rows; allocation is computed client-side only.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    #[serde(rename = "id")]
    pub goal_id: i64,
    pub user_id: i64,
    #[serde(rename = "name")]
    pub goal_name: String,
    pub target_amount: f64,
    pub time_frame: i64,
    pub progress: f64,
    #[serde(rename = "createdAt")]
    pub goal_created_at: String,
}
