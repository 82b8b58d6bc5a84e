use crate::app_data::{AppData, Snapshot};
use crate::availability::total_capacity;
use crate::domain::*;
use crate::{KakuhoError, Result};
use chrono::NaiveDate;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Suffix appended to the name of a duplicated event.
pub const COPY_SUFFIX: &str = "のコピー";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Event(EventId),
    Stage(StageId),
    SeatGroup(SeatGroupId),
    TicketType(TicketTypeId),
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteTarget::Event(id) => write!(f, "event #{}", id),
            DeleteTarget::Stage(id) => write!(f, "stage #{}", id),
            DeleteTarget::SeatGroup(id) => write!(f, "seat group #{}", id),
            DeleteTarget::TicketType(id) => write!(f, "ticket type #{}", id),
        }
    }
}

/// Reservations anywhere below `target`.
pub fn reservations_under(snapshot: &Snapshot, target: DeleteTarget) -> Vec<&ReservationDetail> {
    match target {
        DeleteTarget::Event(id) => snapshot.reservations_for_event(id),
        DeleteTarget::Stage(id) => snapshot.reservations_for_stage(id),
        DeleteTarget::SeatGroup(id) => snapshot.reservations_for_seat_group(id),
        DeleteTarget::TicketType(id) => snapshot.reservations_for_ticket_type(id),
    }
}

/// Client-side guard only: it reads the loaded reservations and can race with
/// bookings made since the last load.
pub fn can_delete(snapshot: &Snapshot, target: DeleteTarget) -> bool {
    reservations_under(snapshot, target).is_empty()
}

pub fn ensure_deletable(snapshot: &Snapshot, target: DeleteTarget) -> Result<()> {
    let blocking = reservations_under(snapshot, target).len();
    if blocking > 0 {
        return Err(KakuhoError::DeleteBlocked(format!(
            "{} has {} reservation(s)",
            target, blocking
        )));
    }
    Ok(())
}

/// Upper bound of the capacity slider for a seat group.
pub fn capacity_slider_max(capacity: u32) -> u32 {
    if capacity < 35 {
        50
    } else {
        (capacity.saturating_mul(3) / 2).min(1000)
    }
}

/// Shift applied to every stage when an event is copied to `new_start`:
/// whole days between the JST dates of the first stage and `new_start`.
pub fn duplicate_offset(original_start: &Timestamp, new_start: NaiveDate) -> chrono::Duration {
    let original_date = original_start.with_timezone(&jst()).date_naive();
    new_start.signed_duration_since(original_date)
}

// Ids removed when deleting `target`, grouped by level (stages, seat groups, ticket types)
struct Subtree {
    stages: Vec<StageId>,
    seat_groups: Vec<SeatGroupId>,
    ticket_types: Vec<TicketTypeId>,
}

fn subtree(snapshot: &Snapshot, target: DeleteTarget) -> Subtree {
    let stages: Vec<StageId> = match target {
        DeleteTarget::Event(id) => snapshot.stages_for_event(id).iter().map(|s| s.id).collect(),
        DeleteTarget::Stage(id) => vec![id],
        _ => Vec::new(),
    };
    let seat_groups: Vec<SeatGroupId> = match target {
        DeleteTarget::SeatGroup(id) => vec![id],
        DeleteTarget::TicketType(_) => Vec::new(),
        _ => stages
            .iter()
            .flat_map(|stage_id| snapshot.seat_groups_for_stage(*stage_id))
            .map(|sg| sg.id)
            .collect(),
    };
    let ticket_types: Vec<TicketTypeId> = match target {
        DeleteTarget::TicketType(id) => vec![id],
        _ => seat_groups
            .iter()
            .flat_map(|sg_id| snapshot.ticket_types_for_seat_group(*sg_id))
            .map(|tt| tt.id)
            .collect(),
    };

    Subtree {
        stages,
        seat_groups,
        ticket_types,
    }
}

/// Administrative operations on events and their stage/seat/ticket tree.
/// Every operation reloads the snapshot once it settles.
#[derive(Clone)]
pub struct EventManager {
    app: Arc<AppData>,
}

impl EventManager {
    pub fn new(app: Arc<AppData>) -> Self {
        Self { app }
    }

    pub async fn create_event(&self, data: &EventCreate) -> Result<Event> {
        let result = self.app.api().create_event(data).await;
        self.app.settle("create event", result).await
    }

    pub async fn update_event(&self, id: EventId, data: &EventUpdate) -> Result<Event> {
        let result = self.app.api().update_event(id, data).await;
        self.app.settle(&format!("update event #{}", id), result).await
    }

    pub async fn create_stage(&self, event_id: EventId, data: &StageCreate) -> Result<Stage> {
        if data.end_time <= data.start_time {
            return Err(KakuhoError::Validation(
                "stage must end after it starts".to_string(),
            ));
        }
        let result = self.app.api().create_stage(event_id, data).await;
        self.app
            .settle(&format!("create stage for event #{}", event_id), result)
            .await
    }

    pub async fn update_stage(&self, id: StageId, data: &StageUpdate) -> Result<Stage> {
        if let (Some(start), Some(end)) = (&data.start_time, &data.end_time) {
            if end <= start {
                return Err(KakuhoError::Validation(
                    "stage must end after it starts".to_string(),
                ));
            }
        }
        let result = self.app.api().update_stage(id, data).await;
        self.app.settle(&format!("update stage #{}", id), result).await
    }

    pub async fn create_seat_group(&self, stage_id: StageId, data: &SeatGroupCreate) -> Result<SeatGroup> {
        let result = self.app.api().create_seat_group(stage_id, data).await;
        self.app
            .settle(&format!("create seat group for stage #{}", stage_id), result)
            .await
    }

    pub async fn update_seat_group(&self, id: SeatGroupId, data: &SeatGroupUpdate) -> Result<SeatGroup> {
        let result = self.app.api().update_seat_group(id, data).await;
        self.app
            .settle(&format!("update seat group #{}", id), result)
            .await
    }

    pub async fn create_ticket_type(
        &self,
        seat_group_id: SeatGroupId,
        data: &TicketTypeCreate,
    ) -> Result<TicketType> {
        if data.type_name.trim().is_empty() {
            return Err(KakuhoError::Validation(
                "ticket type name is required".to_string(),
            ));
        }
        let result = self.app.api().create_ticket_type(seat_group_id, data).await;
        self.app
            .settle(
                &format!("create ticket type for seat group #{}", seat_group_id),
                result,
            )
            .await
    }

    pub async fn update_ticket_type(&self, id: TicketTypeId, data: &TicketTypeUpdate) -> Result<TicketType> {
        let result = self.app.api().update_ticket_type(id, data).await;
        self.app
            .settle(&format!("update ticket type #{}", id), result)
            .await
    }

    pub async fn update_user(&self, id: UserId, data: &UserUpdate) -> Result<User> {
        let result = self.app.api().update_user(id, data).await;
        self.app.settle(&format!("update user #{}", id), result).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        let result = self.app.api().delete_user(id).await;
        self.app.settle(&format!("delete user #{}", id), result).await
    }

    /// Delete `target` and everything below it, deepest level first.
    ///
    /// Refused without contacting the server while any loaded reservation
    /// sits under the target.
    pub async fn delete(&self, target: DeleteTarget) -> Result<()> {
        let snapshot = self.app.snapshot();
        ensure_deletable(&snapshot, target)?;

        let result = self.delete_subtree(&snapshot, target).await;
        self.app.settle(&format!("delete {}", target), result).await
    }

    async fn delete_subtree(&self, snapshot: &Snapshot, target: DeleteTarget) -> Result<()> {
        let api = self.app.api().as_ref();
        let tree = subtree(snapshot, target);

        info!(
            "Deleting {}: {} ticket types, {} seat groups, {} stages",
            target,
            tree.ticket_types.len(),
            tree.seat_groups.len(),
            tree.stages.len()
        );

        try_join_all(tree.ticket_types.iter().map(|id| api.delete_ticket_type(*id))).await?;
        try_join_all(tree.seat_groups.iter().map(|id| api.delete_seat_group(*id))).await?;
        try_join_all(tree.stages.iter().map(|id| api.delete_stage(*id))).await?;

        if let DeleteTarget::Event(id) = target {
            api.delete_event(id).await?;
        }
        Ok(())
    }

    /// Save edited remaining capacities. Only seat groups whose value differs
    /// from the loaded snapshot are sent. Returns how many were updated.
    pub async fn adjust_capacities(&self, capacities: &HashMap<SeatGroupId, u32>) -> Result<usize> {
        let snapshot = self.app.snapshot();
        let changed: Vec<(SeatGroupId, u32)> = snapshot
            .seat_groups()
            .iter()
            .filter_map(|sg| {
                capacities
                    .get(&sg.id)
                    .filter(|capacity| **capacity != sg.capacity)
                    .map(|capacity| (sg.id, *capacity))
            })
            .collect();

        info!("Adjusting capacity of {} seat group(s)", changed.len());

        let api = self.app.api().as_ref();
        let result = try_join_all(changed.iter().map(|(id, capacity)| {
            let data = SeatGroupUpdate {
                capacity: Some(*capacity),
            };
            async move { api.update_seat_group(*id, &data).await }
        }))
        .await
        .map(|updated| updated.len());

        self.app.settle("adjust seat group capacities", result).await
    }

    /// Copy an event so that its first stage falls on `start_date` (JST).
    ///
    /// Each seat group is created with its total capacity (remaining plus
    /// reserved), since the copy starts with no reservations.
    pub async fn duplicate_event(&self, event_id: EventId, start_date: NaiveDate) -> Result<Event> {
        let snapshot = self.app.snapshot();
        let event = snapshot
            .event(event_id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(format!("event #{}", event_id)))?;
        let original_start = snapshot.event_start_date(event_id).copied().ok_or_else(|| {
            KakuhoError::Validation(format!("event #{} has no stages to copy", event_id))
        })?;
        let offset = duplicate_offset(&original_start, start_date);

        info!(
            "Duplicating event #{} to start on {} (shift {} days)",
            event_id,
            start_date,
            offset.num_days()
        );

        let result = self.copy_event(&snapshot, &event, offset).await;
        self.app
            .settle(&format!("duplicate event #{}", event_id), result)
            .await
    }

    async fn copy_event(&self, snapshot: &Snapshot, event: &Event, offset: chrono::Duration) -> Result<Event> {
        let api = self.app.api().as_ref();
        let new_event = api
            .create_event(&EventCreate {
                name: format!("{}{}", event.name, COPY_SUFFIX),
                description: event.description.clone(),
            })
            .await?;

        let new_event_id = new_event.id;
        try_join_all(
            snapshot
                .stages_for_event(event.id)
                .into_iter()
                .map(|stage| copy_stage(api, snapshot, stage, new_event_id, offset)),
        )
        .await?;

        Ok(new_event)
    }
}

async fn copy_stage(
    api: &dyn crate::api::KakuhoApi,
    snapshot: &Snapshot,
    stage: &Stage,
    new_event_id: EventId,
    offset: chrono::Duration,
) -> Result<()> {
    let new_stage = api
        .create_stage(
            new_event_id,
            &StageCreate {
                start_time: stage.start_time + offset,
                end_time: stage.end_time + offset,
            },
        )
        .await?;

    let new_stage_id = new_stage.id;
    try_join_all(snapshot.seat_groups_for_stage(stage.id).into_iter().map(|seat_group| {
        let data = SeatGroupCreate {
            capacity: total_capacity(snapshot, seat_group),
        };
        async move {
            let new_seat_group = api.create_seat_group(new_stage_id, &data).await?;
            let new_seat_group_id = new_seat_group.id;

            try_join_all(
                snapshot
                    .ticket_types_for_seat_group(seat_group.id)
                    .into_iter()
                    .map(|ticket_type| {
                        let data = TicketTypeCreate {
                            type_name: ticket_type.type_name.clone(),
                            price: ticket_type.price,
                        };
                        async move { api.create_ticket_type(new_seat_group_id, &data).await }
                    }),
            )
            .await?;

            Ok::<(), KakuhoError>(())
        }
    }))
    .await?;

    Ok(())
}
