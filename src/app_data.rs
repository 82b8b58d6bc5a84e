use crate::api::KakuhoApi;
use crate::domain::*;
use crate::metrics::ClientMetrics;
use crate::{KakuhoError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// The single message surfaced to consumers when a load fails for any reason.
pub const LOAD_ERROR_MESSAGE: &str = "データの取得に失敗しました";

/// Entity collections as fetched from the server in one load.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub events: Vec<Event>,
    pub stages: Vec<Stage>,
    pub seat_groups: Vec<SeatGroup>,
    pub ticket_types: Vec<TicketType>,
    pub reservations: Vec<Reservation>,
    pub users: Vec<User>,
}

/// Immutable, generation-stamped view of everything the current user can see.
///
/// A snapshot is built in full or not at all: a reservation whose references
/// do not resolve fails the whole build.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    generation: u64,
    loaded_at: Option<DateTime<Utc>>,
    events: Vec<Event>,
    stages: Vec<Stage>,
    seat_groups: Vec<SeatGroup>,
    ticket_types: Vec<TicketType>,
    users: Vec<User>,
    reservations: Vec<ReservationDetail>,
    seat_group_names: HashMap<SeatGroupId, Vec<String>>,
    event_start_dates: HashMap<EventId, Timestamp>,
    event_end_dates: HashMap<EventId, Timestamp>,
}

impl Snapshot {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    pub fn build(generation: u64, collections: Collections) -> Result<Self> {
        let reservations = join_reservations(&collections)?;

        let mut event_start_dates = HashMap::new();
        let mut event_end_dates = HashMap::new();
        for stage in &collections.stages {
            event_start_dates
                .entry(stage.event_id)
                .and_modify(|start: &mut Timestamp| {
                    if stage.start_time < *start {
                        *start = stage.start_time;
                    }
                })
                .or_insert(stage.start_time);
            event_end_dates
                .entry(stage.event_id)
                .and_modify(|end: &mut Timestamp| {
                    if stage.end_time > *end {
                        *end = stage.end_time;
                    }
                })
                .or_insert(stage.end_time);
        }

        let seat_group_names = collections
            .seat_groups
            .iter()
            .map(|sg| {
                let names = collections
                    .ticket_types
                    .iter()
                    .filter(|tt| tt.seat_group_id == sg.id)
                    .map(|tt| tt.type_name.clone())
                    .collect();
                (sg.id, names)
            })
            .collect();

        Ok(Self {
            generation,
            loaded_at: Some(Utc::now()),
            events: collections.events,
            stages: collections.stages,
            seat_groups: collections.seat_groups,
            ticket_types: collections.ticket_types,
            users: collections.users,
            reservations,
            seat_group_names,
            event_start_dates,
            event_end_dates,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn seat_groups(&self) -> &[SeatGroup] {
        &self.seat_groups
    }

    pub fn ticket_types(&self) -> &[TicketType] {
        &self.ticket_types
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn reservations(&self) -> &[ReservationDetail] {
        &self.reservations
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn seat_group(&self, id: SeatGroupId) -> Option<&SeatGroup> {
        self.seat_groups.iter().find(|sg| sg.id == id)
    }

    pub fn ticket_type(&self, id: TicketTypeId) -> Option<&TicketType> {
        self.ticket_types.iter().find(|tt| tt.id == id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn reservation(&self, id: ReservationId) -> Option<&ReservationDetail> {
        self.reservations.iter().find(|r| r.reservation.id == id)
    }

    /// Ticket type names per seat group, in server order.
    pub fn seat_group_names(&self) -> &HashMap<SeatGroupId, Vec<String>> {
        &self.seat_group_names
    }

    pub fn seat_group_label(&self, id: SeatGroupId) -> String {
        self.seat_group_names
            .get(&id)
            .map(|names| names.join("・"))
            .unwrap_or_default()
    }

    /// Earliest stage start of an event. Events without stages have none.
    pub fn event_start_date(&self, id: EventId) -> Option<&Timestamp> {
        self.event_start_dates.get(&id)
    }

    /// Latest stage end of an event.
    pub fn event_end_date(&self, id: EventId) -> Option<&Timestamp> {
        self.event_end_dates.get(&id)
    }

    pub fn event_start_dates(&self) -> &HashMap<EventId, Timestamp> {
        &self.event_start_dates
    }

    pub fn event_end_dates(&self) -> &HashMap<EventId, Timestamp> {
        &self.event_end_dates
    }

    pub fn is_future_event(&self, id: EventId, now: DateTime<Utc>) -> bool {
        self.event_end_dates
            .get(&id)
            .map(|end| end.with_timezone(&Utc) > now)
            .unwrap_or(false)
    }

    /// Events still running or upcoming, earliest start first.
    pub fn future_events(&self, now: DateTime<Utc>) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| self.is_future_event(e.id, now))
            .collect();
        events.sort_by_key(|e| self.event_start_dates.get(&e.id).copied());
        events
    }

    /// Finished events (and events without stages), latest start first.
    pub fn past_events(&self, now: DateTime<Utc>) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| !self.is_future_event(e.id, now))
            .collect();
        events.sort_by(|a, b| {
            let a_start = self.event_start_dates.get(&a.id);
            let b_start = self.event_start_dates.get(&b.id);
            b_start.cmp(&a_start)
        });
        events
    }

    pub fn stages_for_event(&self, event_id: EventId) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self
            .stages
            .iter()
            .filter(|s| s.event_id == event_id)
            .collect();
        stages.sort_by_key(|s| s.start_time);
        stages
    }

    pub fn seat_groups_for_stage(&self, stage_id: StageId) -> Vec<&SeatGroup> {
        self.seat_groups
            .iter()
            .filter(|sg| sg.stage_id == stage_id)
            .collect()
    }

    pub fn ticket_types_for_seat_group(&self, seat_group_id: SeatGroupId) -> Vec<&TicketType> {
        self.ticket_types
            .iter()
            .filter(|tt| tt.seat_group_id == seat_group_id)
            .collect()
    }

    pub fn ticket_types_for_stage(&self, stage_id: StageId) -> Vec<&TicketType> {
        self.seat_groups_for_stage(stage_id)
            .into_iter()
            .flat_map(|sg| self.ticket_types_for_seat_group(sg.id))
            .collect()
    }

    pub fn seat_group_for_ticket_type(&self, ticket_type_id: TicketTypeId) -> Option<&SeatGroup> {
        self.ticket_type(ticket_type_id)
            .and_then(|tt| self.seat_group(tt.seat_group_id))
    }

    pub fn reservations_for_event(&self, event_id: EventId) -> Vec<&ReservationDetail> {
        self.reservations
            .iter()
            .filter(|r| r.event.id == event_id)
            .collect()
    }

    pub fn reservations_for_stage(&self, stage_id: StageId) -> Vec<&ReservationDetail> {
        self.reservations
            .iter()
            .filter(|r| r.stage.id == stage_id)
            .collect()
    }

    pub fn reservations_for_seat_group(&self, seat_group_id: SeatGroupId) -> Vec<&ReservationDetail> {
        self.reservations
            .iter()
            .filter(|r| r.seat_group.id == seat_group_id)
            .collect()
    }

    pub fn reservations_for_ticket_type(&self, ticket_type_id: TicketTypeId) -> Vec<&ReservationDetail> {
        self.reservations
            .iter()
            .filter(|r| r.ticket_type.id == ticket_type_id)
            .collect()
    }

    pub fn reservations_for_user(&self, user_id: UserId) -> Vec<&ReservationDetail> {
        self.reservations
            .iter()
            .filter(|r| r.user.id == user_id)
            .collect()
    }
}

/// Join every reservation through TicketType → SeatGroup → Stage → Event and User.
pub fn join_reservations(collections: &Collections) -> Result<Vec<ReservationDetail>> {
    let ticket_types: HashMap<TicketTypeId, &TicketType> =
        collections.ticket_types.iter().map(|t| (t.id, t)).collect();
    let seat_groups: HashMap<SeatGroupId, &SeatGroup> =
        collections.seat_groups.iter().map(|sg| (sg.id, sg)).collect();
    let stages: HashMap<StageId, &Stage> =
        collections.stages.iter().map(|s| (s.id, s)).collect();
    let events: HashMap<EventId, &Event> =
        collections.events.iter().map(|e| (e.id, e)).collect();
    let users: HashMap<UserId, &User> = collections.users.iter().map(|u| (u.id, u)).collect();

    collections
        .reservations
        .iter()
        .map(|res| -> Result<ReservationDetail> {
            let ticket_type = ticket_types.get(&res.ticket_type_id).ok_or_else(|| {
                broken(res.id, "ticket type", res.ticket_type_id)
            })?;
            let seat_group = seat_groups.get(&ticket_type.seat_group_id).ok_or_else(|| {
                broken(res.id, "seat group", ticket_type.seat_group_id)
            })?;
            let stage = stages
                .get(&seat_group.stage_id)
                .ok_or_else(|| broken(res.id, "stage", seat_group.stage_id))?;
            let event = events
                .get(&stage.event_id)
                .ok_or_else(|| broken(res.id, "event", stage.event_id))?;
            let user = users
                .get(&res.user_id)
                .ok_or_else(|| broken(res.id, "user", res.user_id))?;

            Ok(ReservationDetail {
                reservation: res.clone(),
                event: (*event).clone(),
                stage: (*stage).clone(),
                seat_group: (*seat_group).clone(),
                ticket_type: (*ticket_type).clone(),
                user: (*user).clone(),
            })
        })
        .collect()
}

fn broken(reservation_id: ReservationId, entity: &str, id: i64) -> KakuhoError {
    KakuhoError::BrokenReference(format!(
        "reservation #{} references missing {} #{}",
        reservation_id, entity, id
    ))
}

#[derive(Debug, Default)]
struct LoadStatus {
    applied: u64,
    error: Option<String>,
}

// Keeps `loading` true while any load is in flight
struct TaskGuard<'a>(&'a AtomicUsize);

impl<'a> TaskGuard<'a> {
    fn enter(tasks: &'a AtomicUsize) -> Self {
        tasks.fetch_add(1, Ordering::SeqCst);
        Self(tasks)
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the client-side snapshot for the current user.
///
/// Mutations never patch the snapshot: callers settle a mutation and the
/// whole snapshot is fetched and joined again. Each load is stamped with a
/// generation and only applied if no newer load has been applied already.
pub struct AppData {
    api: Arc<dyn KakuhoApi>,
    user: RwLock<Option<User>>,
    snapshot: watch::Sender<Arc<Snapshot>>,
    issued: AtomicU64,
    status: Mutex<LoadStatus>,
    tasks: AtomicUsize,
    metrics: Option<ClientMetrics>,
}

impl AppData {
    pub fn new(api: Arc<dyn KakuhoApi>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty(0)));

        Self {
            api,
            user: RwLock::new(None),
            snapshot,
            issued: AtomicU64::new(0),
            status: Mutex::new(LoadStatus::default()),
            tasks: AtomicUsize::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn api(&self) -> &Arc<dyn KakuhoApi> {
        &self.api
    }

    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_ref()
    }

    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receive every applied snapshot. Consumers never observe a partial rebuild.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    pub fn loading(&self) -> bool {
        self.tasks.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .error
            .clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Snapshot>> {
        self.api.login(email, password).await?;
        let user = self.api.current_user().await?;
        self.set_user(Some(user)).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.api.logout().await?;
        self.set_user(None).await?;
        Ok(())
    }

    /// Pick up an existing session from the stored token, if it is still valid.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        match self.api.current_user().await {
            Ok(user) => {
                self.set_user(Some(user.clone())).await?;
                Ok(Some(user))
            }
            Err(KakuhoError::Unauthorized) => {
                debug!("No valid session to restore");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Switch the authenticated user. A new user triggers a load; `None` resets
    /// to an empty snapshot and makes any in-flight load stale.
    pub async fn set_user(&self, user: Option<User>) -> Result<Arc<Snapshot>> {
        let changed = {
            let mut current = self
                .user
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == user {
                false
            } else {
                *current = user.clone();
                true
            }
        };

        match user {
            None => {
                let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                info!("User logged out, clearing snapshot (generation {})", generation);
                self.apply(generation, Ok(Snapshot::empty(generation)))
            }
            Some(_) if changed => self.load().await,
            Some(_) => Ok(self.snapshot()),
        }
    }

    /// Fetch all collections in parallel, join them and publish the result.
    pub async fn load(&self) -> Result<Arc<Snapshot>> {
        let Some(user) = self.user() else {
            debug!("No user logged in, skipping load");
            return Ok(self.snapshot());
        };

        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _task = TaskGuard::enter(&self.tasks);
        if let Some(metrics) = &self.metrics {
            metrics.loads_started.inc();
        }

        info!(
            "Loading snapshot generation {} for user {} (admin: {})",
            generation, user.id, user.is_admin
        );

        let started = Instant::now();
        let outcome = self
            .fetch(&user)
            .await
            .and_then(|collections| Snapshot::build(generation, collections));

        let elapsed = started.elapsed();
        debug!("Load generation {} finished in {:?}", generation, elapsed);
        if let Some(metrics) = &self.metrics {
            metrics.record_load(elapsed, outcome.is_ok());
        }

        self.apply(generation, outcome)
    }

    /// Re-run [`AppData::load`] after a mutation has settled.
    pub async fn reload_data(&self) -> Result<Arc<Snapshot>> {
        self.load().await
    }

    /// Resynchronize after a mutation regardless of its outcome, then hand the
    /// mutation's own result back to the caller.
    pub async fn settle<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Some(metrics) = &self.metrics {
            metrics.record_mutation(result.is_ok());
        }

        match &result {
            Ok(_) => info!("{} succeeded", operation),
            Err(e) => warn!("{} failed: {}", operation, e),
        }

        if let Err(e) = self.reload_data().await {
            warn!("Reload after {} failed: {}", operation, e);
        }

        result
    }

    async fn fetch(&self, user: &User) -> Result<Collections> {
        let api = self.api.as_ref();

        let reservations = async {
            if user.is_admin {
                api.list_reservations().await
            } else {
                api.list_user_reservations(user.id).await
            }
        };
        let users = async {
            if user.is_admin {
                api.list_users().await
            } else {
                Ok(vec![user.clone()])
            }
        };

        let (events, stages, seat_groups, ticket_types, reservations, users) = tokio::try_join!(
            api.list_events(),
            api.list_stages(),
            api.list_seat_groups(),
            api.list_ticket_types(),
            reservations,
            users,
        )?;

        Ok(Collections {
            events,
            stages,
            seat_groups,
            ticket_types,
            reservations,
            users,
        })
    }

    fn apply(&self, generation: u64, outcome: Result<Snapshot>) -> Result<Arc<Snapshot>> {
        let mut status = self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if generation <= status.applied {
            debug!(
                "Discarding stale load generation {} (generation {} already applied)",
                generation, status.applied
            );
            if let Some(metrics) = &self.metrics {
                metrics.stale_loads_discarded.inc();
            }
            return outcome.map(|_| self.snapshot.borrow().clone());
        }

        status.applied = generation;
        match outcome {
            Ok(snapshot) => {
                status.error = None;
                if let Some(metrics) = &self.metrics {
                    metrics.record_snapshot(generation, snapshot.reservations.len());
                }
                info!(
                    "Applied snapshot generation {}: {} events, {} stages, {} reservations",
                    generation,
                    snapshot.events.len(),
                    snapshot.stages.len(),
                    snapshot.reservations.len()
                );
                let snapshot = Arc::new(snapshot);
                self.snapshot.send_replace(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                error!("Failed to load snapshot generation {}: {}", generation, e);
                status.error = Some(LOAD_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}
