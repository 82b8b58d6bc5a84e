//! Sold-out flags and quantity ceilings derived from a loaded [`Snapshot`].
//!
//! These are display and form guidance only. The server re-checks capacity on
//! every reservation request.

use crate::app_data::Snapshot;
use crate::domain::*;
use crate::{KakuhoError, Result};

/// Badge shown next to a sold-out stage or ticket type.
pub const SOLD_OUT_LABEL: &str = "完売";

pub fn is_seat_group_sold_out(seat_group: &SeatGroup) -> bool {
    seat_group.is_sold_out()
}

/// A stage is sold out when every seat group attached to it has no seats left.
pub fn is_stage_sold_out(snapshot: &Snapshot, stage_id: StageId) -> bool {
    snapshot
        .seat_groups_for_stage(stage_id)
        .iter()
        .all(|sg| sg.is_sold_out())
}

/// Ticket types share their seat group's pool, so a ticket type is sold out
/// exactly when its seat group is. Unknown ticket types count as sold out.
pub fn is_ticket_type_sold_out(snapshot: &Snapshot, ticket_type_id: TicketTypeId) -> bool {
    snapshot
        .seat_group_for_ticket_type(ticket_type_id)
        .map(|sg| sg.is_sold_out())
        .unwrap_or(true)
}

pub fn ticket_type_remaining(snapshot: &Snapshot, ticket_type_id: TicketTypeId) -> Option<u32> {
    snapshot
        .seat_group_for_ticket_type(ticket_type_id)
        .map(|sg| sg.capacity)
}

/// Attendees already booked against a seat group, from the loaded reservations.
pub fn reserved_attendees(snapshot: &Snapshot, seat_group_id: SeatGroupId) -> u32 {
    snapshot
        .reservations_for_seat_group(seat_group_id)
        .iter()
        .map(|r| r.reservation.num_attendees)
        .sum()
}

/// Remaining seats plus seats already reserved.
pub fn total_capacity(snapshot: &Snapshot, seat_group: &SeatGroup) -> u32 {
    seat_group.capacity + reserved_attendees(snapshot, seat_group.id)
}

pub fn creation_ceiling(seat_group: &SeatGroup, limit: u32) -> u32 {
    seat_group.capacity.min(limit)
}

/// Largest quantity offered when changing `current` to a ticket type drawing
/// on `new_seat_group`. Staying in the same seat group gives the reservation's
/// own seats back to the pool.
pub fn change_ceiling(current: &ReservationDetail, new_seat_group: &SeatGroup, limit: u32) -> u32 {
    let available = if new_seat_group.id == current.seat_group.id {
        new_seat_group.capacity + current.reservation.num_attendees
    } else {
        new_seat_group.capacity
    };
    available.min(limit)
}

pub fn validate_quantity(requested: u32, ceiling: u32) -> Result<()> {
    if requested == 0 {
        return Err(KakuhoError::Validation(
            "at least one attendee is required".to_string(),
        ));
    }
    if requested > ceiling {
        return Err(KakuhoError::Validation(format!(
            "{} attendees exceeds the bookable maximum of {}",
            requested, ceiling
        )));
    }
    Ok(())
}

/// While changing a reservation, ticket types in its own seat group stay
/// selectable even at zero remaining capacity.
pub fn is_ticket_type_sold_out_for_change(
    snapshot: &Snapshot,
    current: &ReservationDetail,
    ticket_type_id: TicketTypeId,
) -> bool {
    match snapshot.ticket_type(ticket_type_id) {
        None => true,
        Some(tt) if tt.seat_group_id == current.seat_group.id => false,
        Some(tt) => snapshot
            .seat_group(tt.seat_group_id)
            .map(|sg| sg.is_sold_out())
            .unwrap_or(true),
    }
}

pub fn is_stage_sold_out_for_change(
    snapshot: &Snapshot,
    current: &ReservationDetail,
    stage_id: StageId,
) -> bool {
    snapshot
        .ticket_types_for_stage(stage_id)
        .iter()
        .all(|tt| is_ticket_type_sold_out_for_change(snapshot, current, tt.id))
}

#[derive(Debug, Clone)]
pub struct TicketTypeAvailability<'a> {
    pub ticket_type: &'a TicketType,
    pub remaining: u32,
    pub sold_out: bool,
}

/// One row of the booking calendar.
#[derive(Debug, Clone)]
pub struct StageAvailability<'a> {
    pub stage: &'a Stage,
    pub sold_out: bool,
    pub remaining: u32,
    pub ticket_types: Vec<TicketTypeAvailability<'a>>,
}

impl StageAvailability<'_> {
    pub fn label(&self) -> Option<&'static str> {
        self.sold_out.then_some(SOLD_OUT_LABEL)
    }
}

pub fn stage_calendar(snapshot: &Snapshot, event_id: EventId) -> Vec<StageAvailability<'_>> {
    snapshot
        .stages_for_event(event_id)
        .into_iter()
        .map(|stage| {
            let seat_groups = snapshot.seat_groups_for_stage(stage.id);
            let ticket_types = snapshot
                .ticket_types_for_stage(stage.id)
                .into_iter()
                .map(|tt| {
                    let remaining = ticket_type_remaining(snapshot, tt.id).unwrap_or(0);
                    TicketTypeAvailability {
                        ticket_type: tt,
                        remaining,
                        sold_out: remaining == 0,
                    }
                })
                .collect();

            StageAvailability {
                stage,
                sold_out: seat_groups.iter().all(|sg| sg.is_sold_out()),
                remaining: seat_groups.iter().map(|sg| sg.capacity).sum(),
                ticket_types,
            }
        })
        .collect()
}
