use crate::app_data::{AppData, Snapshot};
use crate::availability::{
    change_ceiling, creation_ceiling, is_ticket_type_sold_out_for_change, validate_quantity,
};
use crate::domain::*;
use crate::{ClientConfig, KakuhoError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The server calls a reservation form submission turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationPlan {
    /// POST against the ticket type's reservation collection.
    Create {
        ticket_type_id: TicketTypeId,
        user_id: UserId,
        num_attendees: u32,
    },
    /// PUT on the existing reservation; the ticket type is unchanged.
    Update {
        reservation_id: ReservationId,
        user_id: UserId,
        num_attendees: u32,
    },
    /// DELETE the existing reservation, then POST under the new ticket type.
    Move {
        original: Reservation,
        to_ticket_type_id: TicketTypeId,
        num_attendees: u32,
    },
}

impl fmt::Display for ReservationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationPlan::Create {
                ticket_type_id,
                num_attendees,
                ..
            } => write!(
                f,
                "create reservation for {} on ticket type #{}",
                num_attendees, ticket_type_id
            ),
            ReservationPlan::Update {
                reservation_id,
                num_attendees,
                ..
            } => write!(
                f,
                "update reservation #{} to {} attendees",
                reservation_id, num_attendees
            ),
            ReservationPlan::Move {
                original,
                to_ticket_type_id,
                num_attendees,
            } => write!(
                f,
                "move reservation #{} from ticket type #{} to #{} with {} attendees",
                original.id, original.ticket_type_id, to_ticket_type_id, num_attendees
            ),
        }
    }
}

#[derive(Clone)]
pub struct ReservationService {
    app: Arc<AppData>,
    max_per_reservation: u32,
}

impl ReservationService {
    pub fn new(app: Arc<AppData>, config: &ClientConfig) -> Self {
        Self::with_limit(app, config.max_tickets_per_reservation)
    }

    pub fn with_limit(app: Arc<AppData>, max_per_reservation: u32) -> Self {
        Self {
            app,
            max_per_reservation,
        }
    }

    pub fn app(&self) -> &Arc<AppData> {
        &self.app
    }

    pub fn limit(&self) -> u32 {
        self.max_per_reservation
    }

    pub fn plan_create(
        &self,
        snapshot: &Snapshot,
        user_id: UserId,
        ticket_type_id: TicketTypeId,
        num_attendees: u32,
    ) -> Result<ReservationPlan> {
        let seat_group = snapshot
            .seat_group_for_ticket_type(ticket_type_id)
            .ok_or_else(|| {
                KakuhoError::Validation(format!("unknown ticket type #{}", ticket_type_id))
            })?;

        if seat_group.is_sold_out() {
            return Err(KakuhoError::SoldOut(format!(
                "ticket type #{}",
                ticket_type_id
            )));
        }

        validate_quantity(
            num_attendees,
            creation_ceiling(seat_group, self.max_per_reservation),
        )?;

        Ok(ReservationPlan::Create {
            ticket_type_id,
            user_id,
            num_attendees,
        })
    }

    pub fn plan_change(
        &self,
        snapshot: &Snapshot,
        current: &ReservationDetail,
        ticket_type_id: TicketTypeId,
        num_attendees: u32,
    ) -> Result<ReservationPlan> {
        let new_seat_group = snapshot
            .seat_group_for_ticket_type(ticket_type_id)
            .ok_or_else(|| {
                KakuhoError::Validation(format!("unknown ticket type #{}", ticket_type_id))
            })?;

        let new_event_id = snapshot
            .stage(new_seat_group.stage_id)
            .map(|stage| stage.event_id);
        if new_event_id != Some(current.event.id) {
            return Err(KakuhoError::Validation(format!(
                "ticket type #{} does not belong to event #{}",
                ticket_type_id, current.event.id
            )));
        }

        if is_ticket_type_sold_out_for_change(snapshot, current, ticket_type_id) {
            return Err(KakuhoError::SoldOut(format!(
                "ticket type #{}",
                ticket_type_id
            )));
        }

        validate_quantity(
            num_attendees,
            change_ceiling(current, new_seat_group, self.max_per_reservation),
        )?;

        if ticket_type_id == current.ticket_type.id {
            Ok(ReservationPlan::Update {
                reservation_id: current.reservation.id,
                user_id: current.reservation.user_id,
                num_attendees,
            })
        } else {
            Ok(ReservationPlan::Move {
                original: current.reservation.clone(),
                to_ticket_type_id: ticket_type_id,
                num_attendees,
            })
        }
    }

    /// Book `num_attendees` seats of a ticket type for the logged-in user.
    pub async fn create(&self, ticket_type_id: TicketTypeId, num_attendees: u32) -> Result<Reservation> {
        let user = self.app.user().ok_or(KakuhoError::NotAuthenticated)?;
        let snapshot = self.app.snapshot();
        let plan = self.plan_create(&snapshot, user.id, ticket_type_id, num_attendees)?;
        self.execute(plan).await
    }

    pub async fn change(
        &self,
        reservation_id: ReservationId,
        ticket_type_id: TicketTypeId,
        num_attendees: u32,
    ) -> Result<Reservation> {
        let snapshot = self.app.snapshot();
        let current = snapshot.reservation(reservation_id).ok_or_else(|| {
            KakuhoError::NotFound(format!("reservation #{}", reservation_id))
        })?;
        let plan = self.plan_change(&snapshot, current, ticket_type_id, num_attendees)?;
        self.execute(plan).await
    }

    pub async fn cancel(&self, reservation_id: ReservationId) -> Result<()> {
        let result = self.app.api().delete_reservation(reservation_id).await;
        self.app
            .settle(&format!("cancel reservation #{}", reservation_id), result)
            .await
    }

    pub async fn set_paid(&self, reservation_id: ReservationId, is_paid: bool) -> Result<Reservation> {
        let user_id = self
            .app
            .snapshot()
            .reservation(reservation_id)
            .map(|detail| detail.reservation.user_id);
        let update = ReservationUpdate {
            is_paid: Some(is_paid),
            user_id,
            ..Default::default()
        };

        let result = self
            .app
            .api()
            .update_reservation(reservation_id, &update)
            .await;
        self.app
            .settle(
                &format!("mark reservation #{} paid={}", reservation_id, is_paid),
                result,
            )
            .await
    }

    /// Run a plan, then reload whatever the outcome.
    pub async fn execute(&self, plan: ReservationPlan) -> Result<Reservation> {
        let operation = plan.to_string();
        info!("Executing plan: {}", operation);

        let api = self.app.api();
        let result = match &plan {
            ReservationPlan::Create {
                ticket_type_id,
                user_id,
                num_attendees,
            } => {
                let data = ReservationCreate {
                    num_attendees: *num_attendees,
                    user_id: *user_id,
                    is_paid: None,
                };
                api.create_reservation(*ticket_type_id, &data).await
            }
            ReservationPlan::Update {
                reservation_id,
                user_id,
                num_attendees,
            } => {
                let data = ReservationUpdate {
                    num_attendees: Some(*num_attendees),
                    user_id: Some(*user_id),
                    ..Default::default()
                };
                api.update_reservation(*reservation_id, &data).await
            }
            ReservationPlan::Move {
                original,
                to_ticket_type_id,
                num_attendees,
            } => {
                self.move_reservation(original, *to_ticket_type_id, *num_attendees)
                    .await
            }
        };

        self.app.settle(&operation, result).await
    }

    // DELETE then POST; a failed POST re-creates the original reservation
    async fn move_reservation(
        &self,
        original: &Reservation,
        to_ticket_type_id: TicketTypeId,
        num_attendees: u32,
    ) -> Result<Reservation> {
        let api = self.app.api();
        api.delete_reservation(original.id).await?;

        let replacement = ReservationCreate {
            num_attendees,
            user_id: original.user_id,
            is_paid: Some(original.is_paid),
        };
        let create_error = match api.create_reservation(to_ticket_type_id, &replacement).await {
            Ok(reservation) => return Ok(reservation),
            Err(e) => e,
        };

        warn!(
            "Re-creating reservation #{} under ticket type #{} failed ({}), restoring original",
            original.id, to_ticket_type_id, create_error
        );

        let restore = ReservationCreate {
            num_attendees: original.num_attendees,
            user_id: original.user_id,
            is_paid: Some(original.is_paid),
        };
        match api.create_reservation(original.ticket_type_id, &restore).await {
            Ok(restored) => {
                info!(
                    "Restored reservation #{} as #{}",
                    original.id, restored.id
                );
                if let Some(metrics) = self.app.metrics() {
                    metrics.reservations_rolled_back.inc();
                }
                Err(KakuhoError::ChangeRolledBack {
                    restored_id: restored.id,
                    source: Box::new(create_error),
                })
            }
            Err(restore_error) => {
                error!(
                    "Reservation #{} (user {}, ticket type #{}, {} attendees) lost: {}",
                    original.id,
                    original.user_id,
                    original.ticket_type_id,
                    original.num_attendees,
                    restore_error
                );
                if let Some(metrics) = self.app.metrics() {
                    metrics.reservations_lost.inc();
                }
                Err(KakuhoError::ReservationLost {
                    reservation_id: original.id,
                    source: Box::new(create_error),
                })
            }
        }
    }
}
