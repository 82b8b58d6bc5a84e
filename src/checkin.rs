use crate::app_data::{AppData, Snapshot};
use crate::booking::ReservationService;
use crate::domain::*;
use crate::{KakuhoError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Every ticket QR code encodes this prefix followed by the reservation id.
pub const QR_PREFIX: &str = "Kakuho-";

pub fn qr_payload(reservation_id: ReservationId) -> String {
    format!("{}{}", QR_PREFIX, reservation_id)
}

pub fn parse_qr(text: &str) -> Result<ReservationId> {
    let id = text
        .trim()
        .strip_prefix(QR_PREFIX)
        .ok_or_else(|| KakuhoError::InvalidQrCode(text.to_string()))?;

    id.parse()
        .map_err(|_| KakuhoError::InvalidQrCode(text.to_string()))
}

/// What the desk should do with a scanned ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Unpaid reservation for this stage; payment can be taken.
    Ready(ReservationDetail),
    NotFound(ReservationId),
    WrongStage {
        reservation_id: ReservationId,
        stage_id: StageId,
    },
    AlreadyPaid(ReservationDetail),
}

pub fn verify_scan(snapshot: &Snapshot, stage_id: StageId, text: &str) -> Result<ScanOutcome> {
    let reservation_id = parse_qr(text)?;

    let Some(detail) = snapshot.reservation(reservation_id) else {
        return Ok(ScanOutcome::NotFound(reservation_id));
    };

    if detail.stage.id != stage_id {
        Ok(ScanOutcome::WrongStage {
            reservation_id,
            stage_id: detail.stage.id,
        })
    } else if detail.reservation.is_paid {
        Ok(ScanOutcome::AlreadyPaid(detail.clone()))
    } else {
        Ok(ScanOutcome::Ready(detail.clone()))
    }
}

/// Head counts for one stage's check-in list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageAttendance {
    pub reservations: usize,
    pub paid_reservations: usize,
    pub attendees: u32,
    pub checked_in_attendees: u32,
    pub expected_sales: u64,
    pub collected_sales: u64,
}

pub fn stage_attendance(snapshot: &Snapshot, stage_id: StageId) -> StageAttendance {
    snapshot
        .reservations_for_stage(stage_id)
        .into_iter()
        .fold(StageAttendance::default(), |mut acc, detail| {
            let attendees = detail.reservation.num_attendees;
            let price = detail.total_price();
            acc.reservations += 1;
            acc.attendees += attendees;
            acc.expected_sales += price;
            if detail.reservation.is_paid {
                acc.paid_reservations += 1;
                acc.checked_in_attendees += attendees;
                acc.collected_sales += price;
            }
            acc
        })
}

/// Reception desk for a single stage.
#[derive(Clone)]
pub struct CheckInDesk {
    reservations: ReservationService,
    stage_id: StageId,
}

impl CheckInDesk {
    pub fn new(reservations: ReservationService, stage_id: StageId) -> Self {
        Self {
            reservations,
            stage_id,
        }
    }

    fn app(&self) -> &Arc<AppData> {
        self.reservations.app()
    }

    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    pub fn scan(&self, text: &str) -> Result<ScanOutcome> {
        let outcome = verify_scan(&self.app().snapshot(), self.stage_id, text)?;
        match &outcome {
            ScanOutcome::Ready(detail) => info!("Scanned reservation #{} ready for payment", detail.id()),
            ScanOutcome::NotFound(id) => warn!("Scanned reservation #{} not found", id),
            ScanOutcome::WrongStage { reservation_id, stage_id } => warn!(
                "Scanned reservation #{} belongs to stage #{}, not #{}",
                reservation_id, stage_id, self.stage_id
            ),
            ScanOutcome::AlreadyPaid(detail) => info!("Scanned reservation #{} already paid", detail.id()),
        }
        Ok(outcome)
    }

    /// Scan a ticket and mark it paid if it is ready.
    pub async fn admit(&self, text: &str) -> Result<ScanOutcome> {
        let outcome = self.scan(text)?;
        if let ScanOutcome::Ready(detail) = &outcome {
            self.reservations.set_paid(detail.id(), true).await?;
            if let Some(metrics) = self.app().metrics() {
                metrics.check_ins.inc();
            }
        }
        Ok(outcome)
    }

    /// Flip the paid flag of a reservation from the list (or undo a check-in).
    pub async fn toggle_paid(&self, reservation_id: ReservationId) -> Result<Reservation> {
        let is_paid = self
            .app()
            .snapshot()
            .reservation(reservation_id)
            .map(|detail| detail.reservation.is_paid)
            .ok_or_else(|| KakuhoError::NotFound(format!("reservation #{}", reservation_id)))?;

        let updated = self.reservations.set_paid(reservation_id, !is_paid).await?;
        if !is_paid {
            if let Some(metrics) = self.app().metrics() {
                metrics.check_ins.inc();
            }
        }
        Ok(updated)
    }

    pub fn attendance(&self) -> StageAttendance {
        stage_attendance(&self.app().snapshot(), self.stage_id)
    }
}
