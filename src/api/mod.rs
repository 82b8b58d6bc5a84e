pub mod client;
pub mod token;

pub use client::*;
pub use token::*;

use crate::domain::*;
use crate::Result;
use async_trait::async_trait;

/// The remote entity store. The server owns persistence, capacity accounting
/// and authorization; every client-side rule is advisory.
#[async_trait]
pub trait KakuhoApi: Send + Sync {
    // Authentication
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken>;
    async fn logout(&self) -> Result<()>;
    async fn current_user(&self) -> Result<User>;
    async fn signup(&self, data: &UserCreate) -> Result<User>;

    // Events
    async fn list_events(&self) -> Result<Vec<Event>>;
    async fn get_event(&self, id: EventId) -> Result<Event>;
    async fn get_event_duration(&self, id: EventId) -> Result<EventDuration>;
    async fn create_event(&self, data: &EventCreate) -> Result<Event>;
    async fn update_event(&self, id: EventId, data: &EventUpdate) -> Result<Event>;
    async fn delete_event(&self, id: EventId) -> Result<()>;

    // Stages
    async fn list_stages(&self) -> Result<Vec<Stage>>;
    async fn list_event_stages(&self, event_id: EventId) -> Result<Vec<Stage>>;
    async fn get_stage(&self, id: StageId) -> Result<Stage>;
    async fn create_stage(&self, event_id: EventId, data: &StageCreate) -> Result<Stage>;
    async fn update_stage(&self, id: StageId, data: &StageUpdate) -> Result<Stage>;
    async fn delete_stage(&self, id: StageId) -> Result<()>;

    // Seat groups
    async fn list_seat_groups(&self) -> Result<Vec<SeatGroup>>;
    async fn list_stage_seat_groups(&self, stage_id: StageId) -> Result<Vec<SeatGroup>>;
    async fn get_seat_group(&self, id: SeatGroupId) -> Result<SeatGroup>;
    async fn create_seat_group(
        &self,
        stage_id: StageId,
        data: &SeatGroupCreate,
    ) -> Result<SeatGroup>;
    async fn update_seat_group(&self, id: SeatGroupId, data: &SeatGroupUpdate)
        -> Result<SeatGroup>;
    async fn delete_seat_group(&self, id: SeatGroupId) -> Result<()>;

    // Ticket types
    async fn list_ticket_types(&self) -> Result<Vec<TicketType>>;
    async fn list_seat_group_ticket_types(
        &self,
        seat_group_id: SeatGroupId,
    ) -> Result<Vec<TicketType>>;
    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketType>;
    async fn create_ticket_type(
        &self,
        seat_group_id: SeatGroupId,
        data: &TicketTypeCreate,
    ) -> Result<TicketType>;
    async fn update_ticket_type(
        &self,
        id: TicketTypeId,
        data: &TicketTypeUpdate,
    ) -> Result<TicketType>;
    async fn delete_ticket_type(&self, id: TicketTypeId) -> Result<()>;

    // Reservations
    async fn list_reservations(&self) -> Result<Vec<Reservation>>;
    async fn list_user_reservations(&self, user_id: UserId) -> Result<Vec<Reservation>>;
    async fn list_ticket_type_reservations(
        &self,
        ticket_type_id: TicketTypeId,
    ) -> Result<Vec<Reservation>>;
    async fn get_reservation(&self, id: ReservationId) -> Result<Reservation>;
    async fn create_reservation(
        &self,
        ticket_type_id: TicketTypeId,
        data: &ReservationCreate,
    ) -> Result<Reservation>;
    async fn update_reservation(
        &self,
        id: ReservationId,
        data: &ReservationUpdate,
    ) -> Result<Reservation>;
    async fn delete_reservation(&self, id: ReservationId) -> Result<()>;

    // Users
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, id: UserId) -> Result<User>;
    async fn update_user(&self, id: UserId, data: &UserUpdate) -> Result<User>;
    async fn delete_user(&self, id: UserId) -> Result<()>;
}
