use super::{EventId, ReservationId, SeatGroupId, StageId, TicketTypeId, UserId};

// REST resource paths
pub struct Routes;

impl Routes {
    pub const EVENTS: &'static str = "/events";
    pub const STAGES: &'static str = "/stages";
    pub const SEAT_GROUPS: &'static str = "/seat_groups";
    pub const TICKET_TYPES: &'static str = "/ticket_types";
    pub const RESERVATIONS: &'static str = "/reservations";
    pub const USERS: &'static str = "/users";
    pub const SIGNUP: &'static str = "/signup";
    pub const TOKEN: &'static str = "/token";
    pub const CURRENT_USER: &'static str = "/users/me";
}

// Path builders for single resources and nested collections
pub fn event_path(id: EventId) -> String {
    format!("{}/{}", Routes::EVENTS, id)
}

pub fn event_duration_path(id: EventId) -> String {
    format!("{}/{}/duration", Routes::EVENTS, id)
}

pub fn event_stages_path(id: EventId) -> String {
    format!("{}/{}/stages", Routes::EVENTS, id)
}

pub fn stage_path(id: StageId) -> String {
    format!("{}/{}", Routes::STAGES, id)
}

pub fn stage_seat_groups_path(id: StageId) -> String {
    format!("{}/{}/seat_groups", Routes::STAGES, id)
}

pub fn seat_group_path(id: SeatGroupId) -> String {
    format!("{}/{}", Routes::SEAT_GROUPS, id)
}

pub fn seat_group_ticket_types_path(id: SeatGroupId) -> String {
    format!("{}/{}/ticket_types", Routes::SEAT_GROUPS, id)
}

pub fn ticket_type_path(id: TicketTypeId) -> String {
    format!("{}/{}", Routes::TICKET_TYPES, id)
}

pub fn ticket_type_reservations_path(id: TicketTypeId) -> String {
    format!("{}/{}/reservations", Routes::TICKET_TYPES, id)
}

pub fn reservation_path(id: ReservationId) -> String {
    format!("{}/{}", Routes::RESERVATIONS, id)
}

pub fn user_path(id: UserId) -> String {
    format!("{}/{}", Routes::USERS, id)
}

pub fn user_reservations_path(id: UserId) -> String {
    format!("{}/{}/reservations", Routes::USERS, id)
}
