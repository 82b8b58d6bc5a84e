use super::event::{Event, Stage};
use super::seating::{SeatGroup, TicketType, TicketTypeId};
use super::time::{self, Timestamp};
use super::user::{User, UserId};
use serde::{Deserialize, Serialize};

pub type ReservationId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub ticket_type_id: TicketTypeId,
    pub user_id: UserId,
    pub num_attendees: u32,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(with = "time::wire")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub num_attendees: u32,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_attendees: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// A reservation joined with everything it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetail {
    pub reservation: Reservation,
    pub event: Event,
    pub stage: Stage,
    pub seat_group: SeatGroup,
    pub ticket_type: TicketType,
    pub user: User,
}

impl ReservationDetail {
    pub fn id(&self) -> ReservationId {
        self.reservation.id
    }

    /// Amount due in yen.
    pub fn total_price(&self) -> u64 {
        u64::from(self.ticket_type.price) * u64::from(self.reservation.num_attendees)
    }
}
