use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, Utc};
use kakuho::availability::stage_calendar;
use kakuho::checkin::{qr_payload, CheckInDesk, ScanOutcome};
use kakuho::format::{format_jst, yen, JstFormat};
use kakuho::management::{capacity_slider_max, DeleteTarget, EventManager};
use kakuho::{
    AppData, ClientConfig, ClientMetrics, EventId, ReservationDetail, ReservationId,
    ReservationService, SeatGroupId, StageId, TicketTypeId, User,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct Context {
    pub app: Arc<AppData>,
    pub config: ClientConfig,
    pub metrics: ClientMetrics,
}

impl Context {
    /// Restore the stored session and load the snapshot for it.
    pub async fn require_session(&self) -> Result<User> {
        let user = self
            .app
            .restore_session()
            .await?
            .ok_or_else(|| anyhow!("Not logged in, run `kakuho login` first"))?;

        if let Some(message) = self.app.error() {
            bail!("{}", message);
        }
        Ok(user)
    }

    fn reservations(&self) -> ReservationService {
        ReservationService::new(self.app.clone(), &self.config)
    }

    fn manager(&self) -> EventManager {
        EventManager::new(self.app.clone())
    }
}

pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let snapshot = ctx.app.login(email, password).await?;
    let user = ctx
        .app
        .user()
        .ok_or_else(|| anyhow!("Login succeeded but no user was returned"))?;

    println!(
        "Logged in as {} ({} events, {} reservations)",
        user.display_name(),
        snapshot.events().len(),
        snapshot.reservations().len()
    );
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.app.logout().await?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let user = ctx.app.user().ok_or_else(|| anyhow!("Not logged in"))?;
    println!("#{} {}", user.id, user.email);
    if let Some(nickname) = &user.nickname {
        println!("  nickname: {}", nickname);
    }
    println!("  admin: {}", user.is_admin);
    Ok(())
}

pub fn events(ctx: &Context, past: bool) -> Result<()> {
    let snapshot = ctx.app.snapshot();
    let now = Utc::now();
    let events = if past {
        snapshot.past_events(now)
    } else {
        snapshot.future_events(now)
    };

    if events.is_empty() {
        println!("No events");
        return Ok(());
    }

    for event in events {
        let dates = match (
            snapshot.event_start_date(event.id),
            snapshot.event_end_date(event.id),
        ) {
            (Some(start), Some(end)) => format!(
                "{} - {}",
                format_jst(start, JstFormat::Date),
                format_jst(end, JstFormat::Date)
            ),
            _ => "no stages".to_string(),
        };
        println!("#{} {} [{}]", event.id, event.name, dates);
    }
    Ok(())
}

pub fn calendar(ctx: &Context, event_id: EventId) -> Result<()> {
    let snapshot = ctx.app.snapshot();
    let event = snapshot
        .event(event_id)
        .ok_or_else(|| anyhow!("Event #{} not found", event_id))?;

    println!("{}", event.name);
    if !event.description.is_empty() {
        println!("{}", event.description);
    }

    for row in stage_calendar(&snapshot, event_id) {
        let status = match row.label() {
            Some(label) => label.to_string(),
            None => format!("残り{}席", row.remaining),
        };
        println!(
            "  stage #{} {} - {} {}",
            row.stage.id,
            format_jst(&row.stage.start_time, JstFormat::DateTime),
            format_jst(&row.stage.end_time, JstFormat::Time),
            status
        );
        for tt in row.ticket_types {
            println!(
                "    #{} {} {} (残り{}{})",
                tt.ticket_type.id,
                tt.ticket_type.type_name,
                yen(u64::from(tt.ticket_type.price)),
                tt.remaining,
                if tt.sold_out { ", 完売" } else { "" }
            );
        }
    }
    Ok(())
}

fn print_reservation(detail: &ReservationDetail) {
    println!(
        "#{} {} {} {} x{} {} [{}] {} {}",
        detail.id(),
        detail.event.name,
        format_jst(&detail.stage.start_time, JstFormat::DateTime),
        detail.ticket_type.type_name,
        detail.reservation.num_attendees,
        yen(detail.total_price()),
        if detail.reservation.is_paid { "paid" } else { "unpaid" },
        detail.user.display_name(),
        qr_payload(detail.id())
    );
}

pub fn reservations(ctx: &Context, event: Option<EventId>, stage: Option<StageId>) -> Result<()> {
    let snapshot = ctx.app.snapshot();
    let details: Vec<&ReservationDetail> = snapshot
        .reservations()
        .iter()
        .filter(|r| event.map_or(true, |id| r.event.id == id))
        .filter(|r| stage.map_or(true, |id| r.stage.id == id))
        .collect();

    if details.is_empty() {
        println!("No reservations");
    }
    for detail in details {
        print_reservation(detail);
    }
    Ok(())
}

pub async fn book(ctx: &Context, ticket_type_id: TicketTypeId, attendees: u32) -> Result<()> {
    let reservation = ctx.reservations().create(ticket_type_id, attendees).await?;
    println!(
        "Reserved #{} ({} attendees), ticket code {}",
        reservation.id,
        reservation.num_attendees,
        qr_payload(reservation.id)
    );
    Ok(())
}

pub async fn change(
    ctx: &Context,
    reservation_id: ReservationId,
    ticket_type_id: TicketTypeId,
    attendees: u32,
) -> Result<()> {
    let reservation = ctx
        .reservations()
        .change(reservation_id, ticket_type_id, attendees)
        .await?;
    if reservation.id != reservation_id {
        println!(
            "Reservation #{} replaced by #{}, new ticket code {}",
            reservation_id,
            reservation.id,
            qr_payload(reservation.id)
        );
    } else {
        println!("Reservation #{} updated", reservation.id);
    }
    Ok(())
}

pub async fn cancel(ctx: &Context, reservation_id: ReservationId) -> Result<()> {
    ctx.reservations().cancel(reservation_id).await?;
    println!("Reservation #{} cancelled", reservation_id);
    Ok(())
}

pub async fn check_in(ctx: &Context, stage_id: StageId, qr: &str, dry_run: bool) -> Result<()> {
    if ctx.app.snapshot().stage(stage_id).is_none() {
        bail!("Stage #{} not found", stage_id);
    }

    let desk = CheckInDesk::new(ctx.reservations(), stage_id);
    let outcome = if dry_run {
        desk.scan(qr)?
    } else {
        desk.admit(qr).await?
    };

    match outcome {
        ScanOutcome::Ready(detail) => {
            let verb = if dry_run { "Ready" } else { "Checked in" };
            println!(
                "{}: #{} {} x{}, collect {}",
                verb,
                detail.id(),
                detail.user.display_name(),
                detail.reservation.num_attendees,
                yen(detail.total_price())
            );
        }
        ScanOutcome::NotFound(id) => println!("Reservation #{} not found", id),
        ScanOutcome::WrongStage {
            reservation_id,
            stage_id,
        } => println!(
            "Reservation #{} is for stage #{}, not this stage",
            reservation_id, stage_id
        ),
        ScanOutcome::AlreadyPaid(detail) => {
            println!("Reservation #{} is already paid", detail.id())
        }
    }

    let attendance = desk.attendance();
    println!(
        "Stage #{}: {}/{} attendees checked in, {} of {} collected",
        stage_id,
        attendance.checked_in_attendees,
        attendance.attendees,
        yen(attendance.collected_sales),
        yen(attendance.expected_sales)
    );
    Ok(())
}

pub async fn toggle_paid(ctx: &Context, reservation_id: ReservationId) -> Result<()> {
    let stage_id = ctx
        .app
        .snapshot()
        .reservation(reservation_id)
        .map(|detail| detail.stage.id)
        .ok_or_else(|| anyhow!("Reservation #{} not found", reservation_id))?;

    let desk = CheckInDesk::new(ctx.reservations(), stage_id);
    let reservation = desk.toggle_paid(reservation_id).await?;
    println!(
        "Reservation #{} is now {}",
        reservation.id,
        if reservation.is_paid { "paid" } else { "unpaid" }
    );
    Ok(())
}

pub async fn capacity(ctx: &Context, assignments: Vec<(SeatGroupId, u32)>) -> Result<()> {
    let snapshot = ctx.app.snapshot();
    for (id, capacity) in &assignments {
        let seat_group = snapshot
            .seat_group(*id)
            .ok_or_else(|| anyhow!("Seat group #{} not found", id))?;
        let max = capacity_slider_max(seat_group.capacity);
        if *capacity > max {
            bail!(
                "Seat group #{} can be set to at most {} (currently {})",
                id,
                max,
                seat_group.capacity
            );
        }
    }

    let capacities: HashMap<SeatGroupId, u32> = assignments.into_iter().collect();
    let updated = ctx.manager().adjust_capacities(&capacities).await?;
    println!("Updated {} seat group(s)", updated);
    Ok(())
}

pub async fn duplicate(ctx: &Context, event_id: EventId, start_date: NaiveDate) -> Result<()> {
    let event = ctx.manager().duplicate_event(event_id, start_date).await?;
    info!("Duplicated event #{} as #{}", event_id, event.id);
    println!("Created #{} {}", event.id, event.name);
    Ok(())
}

pub async fn delete_event(ctx: &Context, event_id: EventId) -> Result<()> {
    ctx.manager().delete(DeleteTarget::Event(event_id)).await?;
    println!("Event #{} deleted", event_id);
    Ok(())
}

pub fn metrics(ctx: &Context) -> Result<()> {
    print!("{}", ctx.metrics.export()?);
    Ok(())
}
