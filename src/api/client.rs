use super::{KakuhoApi, TokenStore};
use crate::domain::*;
use crate::{ClientConfig, KakuhoError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// reqwest-backed [`KakuhoApi`]. Cloning shares the connection pool and token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let tokens = match &config.token_path {
            Some(path) => TokenStore::persistent(path)?,
            None => TokenStore::in_memory(),
        };
        Self::with_token_store(config, tokens)
    }

    pub fn with_token_store(config: &ClientConfig, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Every request carries the stored bearer token, if any
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.tokens.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                KakuhoError::Timeout(path.to_string())
            } else {
                KakuhoError::Http(e)
            }
        })?;

        match response.status() {
            status if status.is_success() => {
                debug!("API request successful: {} ({})", path, status);
                Ok(response)
            }
            StatusCode::UNAUTHORIZED => {
                warn!("API request unauthorized: {}", path);
                Err(KakuhoError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(KakuhoError::NotFound(path.to_string())),
            status => {
                let message = response.text().await.unwrap_or_default();
                warn!("API request failed: {} ({}): {}", path, status, message);
                Err(KakuhoError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T> {
        let response = self.send(builder, path).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(Method::GET, path), path).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::POST, path).json(body), path)
            .await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::PUT, path).json(body), path)
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }
}

#[async_trait]
impl KakuhoApi for HttpClient {
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let form = [("username", email), ("password", password)];
        let builder = self.request(Method::POST, Routes::TOKEN).form(&form);
        let token: AccessToken = self.send_json(builder, Routes::TOKEN).await?;

        self.tokens.set(token.access_token.as_str())?;
        info!("Logged in as {}", email);
        Ok(token)
    }

    async fn logout(&self) -> Result<()> {
        self.tokens.clear()
    }

    async fn current_user(&self) -> Result<User> {
        self.get_json(Routes::CURRENT_USER).await
    }

    async fn signup(&self, data: &UserCreate) -> Result<User> {
        self.post_json(Routes::SIGNUP, data).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.get_json(Routes::EVENTS).await
    }

    async fn get_event(&self, id: EventId) -> Result<Event> {
        self.get_json(&event_path(id)).await
    }

    async fn get_event_duration(&self, id: EventId) -> Result<EventDuration> {
        self.get_json(&event_duration_path(id)).await
    }

    async fn create_event(&self, data: &EventCreate) -> Result<Event> {
        self.post_json(Routes::EVENTS, data).await
    }

    async fn update_event(&self, id: EventId, data: &EventUpdate) -> Result<Event> {
        self.put_json(&event_path(id), data).await
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.delete(&event_path(id)).await
    }

    async fn list_stages(&self) -> Result<Vec<Stage>> {
        self.get_json(Routes::STAGES).await
    }

    async fn list_event_stages(&self, event_id: EventId) -> Result<Vec<Stage>> {
        self.get_json(&event_stages_path(event_id)).await
    }

    async fn get_stage(&self, id: StageId) -> Result<Stage> {
        self.get_json(&stage_path(id)).await
    }

    async fn create_stage(&self, event_id: EventId, data: &StageCreate) -> Result<Stage> {
        self.post_json(&event_stages_path(event_id), data).await
    }

    async fn update_stage(&self, id: StageId, data: &StageUpdate) -> Result<Stage> {
        self.put_json(&stage_path(id), data).await
    }

    async fn delete_stage(&self, id: StageId) -> Result<()> {
        self.delete(&stage_path(id)).await
    }

    async fn list_seat_groups(&self) -> Result<Vec<SeatGroup>> {
        self.get_json(Routes::SEAT_GROUPS).await
    }

    async fn list_stage_seat_groups(&self, stage_id: StageId) -> Result<Vec<SeatGroup>> {
        self.get_json(&stage_seat_groups_path(stage_id)).await
    }

    async fn get_seat_group(&self, id: SeatGroupId) -> Result<SeatGroup> {
        self.get_json(&seat_group_path(id)).await
    }

    async fn create_seat_group(
        &self,
        stage_id: StageId,
        data: &SeatGroupCreate,
    ) -> Result<SeatGroup> {
        self.post_json(&stage_seat_groups_path(stage_id), data).await
    }

    async fn update_seat_group(
        &self,
        id: SeatGroupId,
        data: &SeatGroupUpdate,
    ) -> Result<SeatGroup> {
        self.put_json(&seat_group_path(id), data).await
    }

    async fn delete_seat_group(&self, id: SeatGroupId) -> Result<()> {
        self.delete(&seat_group_path(id)).await
    }

    async fn list_ticket_types(&self) -> Result<Vec<TicketType>> {
        self.get_json(Routes::TICKET_TYPES).await
    }

    async fn list_seat_group_ticket_types(
        &self,
        seat_group_id: SeatGroupId,
    ) -> Result<Vec<TicketType>> {
        self.get_json(&seat_group_ticket_types_path(seat_group_id))
            .await
    }

    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketType> {
        self.get_json(&ticket_type_path(id)).await
    }

    async fn create_ticket_type(
        &self,
        seat_group_id: SeatGroupId,
        data: &TicketTypeCreate,
    ) -> Result<TicketType> {
        self.post_json(&seat_group_ticket_types_path(seat_group_id), data)
            .await
    }

    async fn update_ticket_type(
        &self,
        id: TicketTypeId,
        data: &TicketTypeUpdate,
    ) -> Result<TicketType> {
        self.put_json(&ticket_type_path(id), data).await
    }

    async fn delete_ticket_type(&self, id: TicketTypeId) -> Result<()> {
        self.delete(&ticket_type_path(id)).await
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>> {
        self.get_json(Routes::RESERVATIONS).await
    }

    async fn list_user_reservations(&self, user_id: UserId) -> Result<Vec<Reservation>> {
        self.get_json(&user_reservations_path(user_id)).await
    }

    async fn list_ticket_type_reservations(
        &self,
        ticket_type_id: TicketTypeId,
    ) -> Result<Vec<Reservation>> {
        self.get_json(&ticket_type_reservations_path(ticket_type_id))
            .await
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.get_json(&reservation_path(id)).await
    }

    async fn create_reservation(
        &self,
        ticket_type_id: TicketTypeId,
        data: &ReservationCreate,
    ) -> Result<Reservation> {
        self.post_json(&ticket_type_reservations_path(ticket_type_id), data)
            .await
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        data: &ReservationUpdate,
    ) -> Result<Reservation> {
        self.put_json(&reservation_path(id), data).await
    }

    async fn delete_reservation(&self, id: ReservationId) -> Result<()> {
        self.delete(&reservation_path(id)).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json(Routes::USERS).await
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        self.get_json(&user_path(id)).await
    }

    async fn update_user(&self, id: UserId, data: &UserUpdate) -> Result<User> {
        self.put_json(&user_path(id), data).await
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.delete(&user_path(id)).await
    }
}
