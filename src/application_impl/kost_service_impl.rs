use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";

pub struct RealKostService {
    client: Arc<dyn AuthenticatedClient>,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
}

impl RealKostService {
    pub fn new(
        client: Arc<dyn AuthenticatedClient>,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client,
            transport,
            session,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> Result<T, KostError> {
        let response = self.client.send(Request::get(path)).await?;
        Ok(response.json()?)
    }
}

/// Encodes an id as exactly one path segment.
fn segment(id: &str) -> Result<Cow<'_, str>, KostError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(KostError::InvalidId(id.to_string()));
    }
    Ok(urlencoding::encode(id))
}

#[async_trait::async_trait]
impl KostService for RealKostService {
    async fn login(&self, input: LoginInput) -> Result<(), KostError> {
        let request = Request::post(LOGIN_PATH).json(&input)?.skip_refresh();
        self.client.send(request).await?;
        self.session.establish();
        info!(email = %input.email, "logged in");
        Ok(())
    }

    async fn logout(&self) -> Result<(), KostError> {
        let result = self
            .client
            .send(Request::post(LOGOUT_PATH).skip_refresh())
            .await;
        // Local markers go regardless of what the backend said.
        self.transport.clear_credentials();
        self.session.end(SessionEndReason::LoggedOut);
        result?;
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, KostError> {
        self.get_json("/rooms".to_string()).await
    }

    async fn tenant(&self, room_id: &RoomId) -> Result<TenantInfo, KostError> {
        self.get_json(format!("/rooms/{}/tenant", segment(&room_id.0)?)).await
    }

    async fn payment_status(&self, room_id: &RoomId) -> Result<PaymentStatus, KostError> {
        self.get_json(format!("/rooms/{}/payments", segment(&room_id.0)?)).await
    }

    async fn cleaning_schedule(&self, room_id: &RoomId) -> Result<Vec<CleaningSlot>, KostError> {
        self.get_json(format!("/rooms/{}/cleaning-schedules", segment(&room_id.0)?))
            .await
    }

    async fn room_dashboard(&self, room_id: &RoomId) -> Result<RoomDashboard, KostError> {
        let (tenant, payment, cleaning) = tokio::try_join!(
            self.tenant(room_id),
            self.payment_status(room_id),
            self.cleaning_schedule(room_id),
        )?;
        Ok(RoomDashboard {
            tenant,
            payment,
            cleaning,
        })
    }

    async fn faq(&self) -> Result<Vec<FaqEntry>, KostError> {
        self.get_json("/faqs".to_string()).await
    }

    async fn registrations(&self) -> Result<Vec<Registration>, KostError> {
        self.get_json("/admin/registrations".to_string()).await
    }

    async fn approve_registration(&self, id: &RegistrationId) -> Result<(), KostError> {
        let path = format!("/admin/registrations/{}/approve", segment(&id.0)?);
        self.client.send(Request::put(path)).await?;
        info!(registration = %id, "registration approved");
        Ok(())
    }

    async fn delete_registration(&self, id: &RegistrationId) -> Result<(), KostError> {
        let path = format!("/admin/registrations/{}", segment(&id.0)?);
        self.client.send(Request::delete(path)).await?;
        info!(registration = %id, "registration deleted");
        Ok(())
    }
}
