use crate::domain_model::RoomId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub room_id: RoomId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub check_in: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Paid,
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub room_id: RoomId,
    pub state: PaymentState,
    pub amount_due: u64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub last_paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSlot {
    pub date: NaiveDate,
    pub area: String,
    #[serde(default)]
    pub done: bool,
}

/// Everything a tenant sees for one room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomDashboard {
    pub tenant: TenantInfo,
    pub payment: PaymentStatus,
    pub cleaning: Vec<CleaningSlot>,
}
