use crate::application_port::ClientError;
use crate::domain_model::*;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum KostError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid id: {0:?}")]
    InvalidId(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait KostService: Send + Sync {
    async fn login(&self, input: LoginInput) -> Result<(), KostError>;
    async fn logout(&self) -> Result<(), KostError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, KostError>;
    async fn tenant(&self, room_id: &RoomId) -> Result<TenantInfo, KostError>;
    async fn payment_status(&self, room_id: &RoomId) -> Result<PaymentStatus, KostError>;
    async fn cleaning_schedule(&self, room_id: &RoomId) -> Result<Vec<CleaningSlot>, KostError>;
    async fn room_dashboard(&self, room_id: &RoomId) -> Result<RoomDashboard, KostError>;
    async fn faq(&self) -> Result<Vec<FaqEntry>, KostError>;

    async fn registrations(&self) -> Result<Vec<Registration>, KostError>;
    async fn approve_registration(&self, id: &RegistrationId) -> Result<(), KostError>;
    async fn delete_registration(&self, id: &RegistrationId) -> Result<(), KostError>;
}
