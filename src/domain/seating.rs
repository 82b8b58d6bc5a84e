use super::event::StageId;
use serde::{Deserialize, Serialize};

pub type SeatGroupId = i64;
pub type TicketTypeId = i64;

/// A pool of interchangeable seats. `capacity` counts the seats still unreserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatGroup {
    pub id: SeatGroupId,
    pub stage_id: StageId,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatGroupCreate {
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatGroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl SeatGroup {
    pub fn is_sold_out(&self) -> bool {
        self.capacity == 0
    }
}

/// A priced ticket class drawing on its seat group's capacity. Prices are in yen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: TicketTypeId,
    pub seat_group_id: SeatGroupId,
    pub type_name: String,
    pub price: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTypeCreate {
    pub type_name: String,
    pub price: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketTypeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}
