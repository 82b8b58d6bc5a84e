#![allow(dead_code)]

use async_trait::async_trait;
use kakuho::*;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PASSWORD: &str = "password";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const BOB_EMAIL: &str = "bob@example.com";

pub const ADMIN_ID: UserId = 1;
pub const ALICE_ID: UserId = 2;
pub const BOB_ID: UserId = 3;

pub const SPRING_EVENT: EventId = 1;
pub const WINTER_EVENT: EventId = 2;
pub const UNSCHEDULED_EVENT: EventId = 3;

pub const SPRING_EVENING: StageId = 11;
pub const SPRING_MATINEE: StageId = 12;
pub const WINTER_STAGE: StageId = 21;

pub const SG_FLOOR: SeatGroupId = 101;
pub const SG_S_SEATS: SeatGroupId = 102;
pub const SG_MATINEE: SeatGroupId = 103;
pub const SG_WINTER: SeatGroupId = 201;

pub const TT_GENERAL: TicketTypeId = 1001;
pub const TT_STUDENT: TicketTypeId = 1002;
pub const TT_S_SEAT: TicketTypeId = 1003;
pub const TT_MATINEE: TicketTypeId = 1004;
pub const TT_WINTER: TicketTypeId = 2001;

pub const RES_ALICE_SPRING: ReservationId = 5001;
pub const RES_BOB_S_SEAT: ReservationId = 5002;
pub const RES_ALICE_WINTER: ReservationId = 5003;

pub fn ts(raw: &str) -> Timestamp {
    parse_timestamp(raw).unwrap()
}

#[derive(Debug, Default)]
pub struct State {
    pub events: Vec<Event>,
    pub stages: Vec<Stage>,
    pub seat_groups: Vec<SeatGroup>,
    pub ticket_types: Vec<TicketType>,
    pub reservations: Vec<Reservation>,
    pub users: Vec<User>,
    pub current_user: Option<UserId>,
    pub next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn seat_group_of(&mut self, ticket_type_id: TicketTypeId) -> Result<&mut SeatGroup> {
        let seat_group_id = self
            .ticket_types
            .iter()
            .find(|tt| tt.id == ticket_type_id)
            .map(|tt| tt.seat_group_id)
            .ok_or_else(|| KakuhoError::NotFound(ticket_type_path(ticket_type_id)))?;
        self.seat_groups
            .iter_mut()
            .find(|sg| sg.id == seat_group_id)
            .ok_or_else(|| KakuhoError::NotFound(seat_group_path(seat_group_id)))
    }
}

/// In-memory stand-in for the Kakuho server. Creating a reservation draws
/// down its seat group's capacity the way the real server does.
#[derive(Debug, Default)]
pub struct StubBackend {
    pub state: Mutex<State>,
    calls: Mutex<Vec<String>>,
    failing_ticket_types: Mutex<HashSet<TicketTypeId>>,
    failing_lists: Mutex<usize>,
    list_delays: Mutex<VecDeque<Duration>>,
}

impl StubBackend {
    pub fn seeded() -> Arc<Self> {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.next_id = 9000;

            state.users = vec![
                User {
                    id: ADMIN_ID,
                    email: ADMIN_EMAIL.to_string(),
                    nickname: Some("管理者".to_string()),
                    is_admin: true,
                },
                User {
                    id: ALICE_ID,
                    email: ALICE_EMAIL.to_string(),
                    nickname: Some("アリス".to_string()),
                    is_admin: false,
                },
                User {
                    id: BOB_ID,
                    email: BOB_EMAIL.to_string(),
                    nickname: None,
                    is_admin: false,
                },
            ];

            state.events = vec![
                Event {
                    id: SPRING_EVENT,
                    name: "春公演".to_string(),
                    description: "二日間の公演".to_string(),
                },
                Event {
                    id: WINTER_EVENT,
                    name: "冬公演".to_string(),
                    description: String::new(),
                },
                Event {
                    id: UNSCHEDULED_EVENT,
                    name: "未定".to_string(),
                    description: String::new(),
                },
            ];

            state.stages = vec![
                Stage {
                    id: SPRING_MATINEE,
                    event_id: SPRING_EVENT,
                    start_time: ts("2030-04-02T13:00:00"),
                    end_time: ts("2030-04-02T15:00:00"),
                },
                Stage {
                    id: SPRING_EVENING,
                    event_id: SPRING_EVENT,
                    start_time: ts("2030-04-01T18:00:00"),
                    end_time: ts("2030-04-01T20:00:00"),
                },
                Stage {
                    id: WINTER_STAGE,
                    event_id: WINTER_EVENT,
                    start_time: ts("2020-12-01T18:00:00"),
                    end_time: ts("2020-12-01T20:00:00"),
                },
            ];

            state.seat_groups = vec![
                SeatGroup {
                    id: SG_FLOOR,
                    stage_id: SPRING_EVENING,
                    capacity: 10,
                },
                SeatGroup {
                    id: SG_S_SEATS,
                    stage_id: SPRING_EVENING,
                    capacity: 0,
                },
                SeatGroup {
                    id: SG_MATINEE,
                    stage_id: SPRING_MATINEE,
                    capacity: 0,
                },
                SeatGroup {
                    id: SG_WINTER,
                    stage_id: WINTER_STAGE,
                    capacity: 5,
                },
            ];

            state.ticket_types = vec![
                TicketType {
                    id: TT_GENERAL,
                    seat_group_id: SG_FLOOR,
                    type_name: "一般".to_string(),
                    price: 3000,
                },
                TicketType {
                    id: TT_STUDENT,
                    seat_group_id: SG_FLOOR,
                    type_name: "学生".to_string(),
                    price: 1500,
                },
                TicketType {
                    id: TT_S_SEAT,
                    seat_group_id: SG_S_SEATS,
                    type_name: "S席".to_string(),
                    price: 5000,
                },
                TicketType {
                    id: TT_MATINEE,
                    seat_group_id: SG_MATINEE,
                    type_name: "一般".to_string(),
                    price: 3000,
                },
                TicketType {
                    id: TT_WINTER,
                    seat_group_id: SG_WINTER,
                    type_name: "一般".to_string(),
                    price: 2000,
                },
            ];

            state.reservations = vec![
                Reservation {
                    id: RES_ALICE_SPRING,
                    ticket_type_id: TT_GENERAL,
                    user_id: ALICE_ID,
                    num_attendees: 2,
                    is_paid: false,
                    created_at: ts("2030-01-10T12:00:00"),
                },
                Reservation {
                    id: RES_BOB_S_SEAT,
                    ticket_type_id: TT_S_SEAT,
                    user_id: BOB_ID,
                    num_attendees: 1,
                    is_paid: true,
                    created_at: ts("2030-01-11T09:30:00"),
                },
                Reservation {
                    id: RES_ALICE_WINTER,
                    ticket_type_id: TT_WINTER,
                    user_id: ALICE_ID,
                    num_attendees: 3,
                    is_paid: false,
                    created_at: ts("2020-11-01T10:00:00"),
                },
            ];
        }
        Arc::new(backend)
    }

    /// Requests seen so far, as `METHOD /path`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("GET "))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Reservation POSTs against this ticket type answer 400.
    pub fn fail_reservations_for(&self, ticket_type_id: TicketTypeId) {
        self.failing_ticket_types
            .lock()
            .unwrap()
            .insert(ticket_type_id);
    }

    /// The next `count` event listings answer 500.
    pub fn fail_next_loads(&self, count: usize) {
        *self.failing_lists.lock().unwrap() = count;
    }

    /// Delay successive event listings, one entry per call.
    pub fn delay_loads(&self, delays: impl IntoIterator<Item = Duration>) {
        self.list_delays.lock().unwrap().extend(delays);
    }

    pub fn seat_group_capacity(&self, id: SeatGroupId) -> u32 {
        self.state
            .lock()
            .unwrap()
            .seat_groups
            .iter()
            .find(|sg| sg.id == id)
            .map(|sg| sg.capacity)
            .unwrap()
    }

    pub fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn add_event(&self, name: &str) -> EventId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.events.push(Event {
            id,
            name: name.to_string(),
            description: String::new(),
        });
        id
    }

    /// Insert a reservation pointing at a ticket type that does not exist.
    pub fn add_dangling_reservation(&self) -> ReservationId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.reservations.push(Reservation {
            id,
            ticket_type_id: 424242,
            user_id: ALICE_ID,
            num_attendees: 1,
            is_paid: false,
            created_at: ts("2030-01-12T10:00:00"),
        });
        id
    }

    fn record(&self, method: &str, path: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", method, path));
    }

    fn remove<T>(items: &mut Vec<T>, path: String, matches: impl Fn(&T) -> bool) -> Result<()> {
        let before = items.len();
        items.retain(|item| !matches(item));
        if items.len() == before {
            return Err(KakuhoError::NotFound(path));
        }
        Ok(())
    }
}

pub fn metrics() -> ClientMetrics {
    ClientMetrics::new().unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn app_for(backend: &Arc<StubBackend>) -> Arc<AppData> {
    init_tracing();
    Arc::new(AppData::new(backend.clone()).with_metrics(metrics()))
}

pub async fn logged_in(backend: &Arc<StubBackend>, email: &str) -> Arc<AppData> {
    let app = app_for(backend);
    app.login(email, PASSWORD).await.unwrap();
    backend.clear_calls();
    app
}

#[async_trait]
impl KakuhoApi for StubBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        self.record("POST", Routes::TOKEN);
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .filter(|_| password == PASSWORD)
            .map(|u| u.id)
            .ok_or(KakuhoError::Unauthorized)?;
        state.current_user = Some(user);
        Ok(AccessToken {
            access_token: format!("token-{}", user),
            token_type: "bearer".to_string(),
        })
    }

    async fn logout(&self) -> Result<()> {
        self.state.lock().unwrap().current_user = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        self.record("GET", Routes::CURRENT_USER);
        let state = self.state.lock().unwrap();
        let id = state.current_user.ok_or(KakuhoError::Unauthorized)?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(KakuhoError::Unauthorized)
    }

    async fn signup(&self, data: &UserCreate) -> Result<User> {
        self.record("POST", Routes::SIGNUP);
        let mut state = self.state.lock().unwrap();
        let user = User {
            id: state.next_id(),
            email: data.email.clone(),
            nickname: data.nickname.clone(),
            is_admin: false,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.record("GET", Routes::EVENTS);
        // Read before sleeping so a delayed listing returns stale data
        let events = self.state.lock().unwrap().events.clone();
        let delay = self.list_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut failing = self.failing_lists.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(KakuhoError::Api {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }
        }
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> Result<Event> {
        self.record("GET", &event_path(id));
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(event_path(id)))
    }

    async fn get_event_duration(&self, id: EventId) -> Result<EventDuration> {
        self.record("GET", &event_duration_path(id));
        let state = self.state.lock().unwrap();
        let stages: Vec<&Stage> = state.stages.iter().filter(|s| s.event_id == id).collect();
        let start_time = stages.iter().map(|s| s.start_time).min();
        let end_time = stages.iter().map(|s| s.end_time).max();
        match (start_time, end_time) {
            (Some(start_time), Some(end_time)) => Ok(EventDuration {
                start_time,
                end_time,
            }),
            _ => Err(KakuhoError::NotFound(event_duration_path(id))),
        }
    }

    async fn create_event(&self, data: &EventCreate) -> Result<Event> {
        self.record("POST", Routes::EVENTS);
        let mut state = self.state.lock().unwrap();
        let event = Event {
            id: state.next_id(),
            name: data.name.clone(),
            description: data.description.clone(),
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: EventId, data: &EventUpdate) -> Result<Event> {
        self.record("PUT", &event_path(id));
        let mut state = self.state.lock().unwrap();
        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| KakuhoError::NotFound(event_path(id)))?;
        if let Some(name) = &data.name {
            event.name = name.clone();
        }
        if let Some(description) = &data.description {
            event.description = description.clone();
        }
        Ok(event.clone())
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.record("DELETE", &event_path(id));
        let mut state = self.state.lock().unwrap();
        Self::remove(&mut state.events, event_path(id), |e| e.id == id)
    }

    async fn list_stages(&self) -> Result<Vec<Stage>> {
        self.record("GET", Routes::STAGES);
        Ok(self.state.lock().unwrap().stages.clone())
    }

    async fn list_event_stages(&self, event_id: EventId) -> Result<Vec<Stage>> {
        self.record("GET", &event_stages_path(event_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .stages
            .iter()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn get_stage(&self, id: StageId) -> Result<Stage> {
        self.record("GET", &stage_path(id));
        self.state
            .lock()
            .unwrap()
            .stages
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(stage_path(id)))
    }

    async fn create_stage(&self, event_id: EventId, data: &StageCreate) -> Result<Stage> {
        self.record("POST", &event_stages_path(event_id));
        let mut state = self.state.lock().unwrap();
        let stage = Stage {
            id: state.next_id(),
            event_id,
            start_time: data.start_time,
            end_time: data.end_time,
        };
        state.stages.push(stage.clone());
        Ok(stage)
    }

    async fn update_stage(&self, id: StageId, data: &StageUpdate) -> Result<Stage> {
        self.record("PUT", &stage_path(id));
        let mut state = self.state.lock().unwrap();
        let stage = state
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| KakuhoError::NotFound(stage_path(id)))?;
        if let Some(start_time) = data.start_time {
            stage.start_time = start_time;
        }
        if let Some(end_time) = data.end_time {
            stage.end_time = end_time;
        }
        Ok(stage.clone())
    }

    async fn delete_stage(&self, id: StageId) -> Result<()> {
        self.record("DELETE", &stage_path(id));
        let mut state = self.state.lock().unwrap();
        Self::remove(&mut state.stages, stage_path(id), |s| s.id == id)
    }

    async fn list_seat_groups(&self) -> Result<Vec<SeatGroup>> {
        self.record("GET", Routes::SEAT_GROUPS);
        Ok(self.state.lock().unwrap().seat_groups.clone())
    }

    async fn list_stage_seat_groups(&self, stage_id: StageId) -> Result<Vec<SeatGroup>> {
        self.record("GET", &stage_seat_groups_path(stage_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .seat_groups
            .iter()
            .filter(|sg| sg.stage_id == stage_id)
            .cloned()
            .collect())
    }

    async fn get_seat_group(&self, id: SeatGroupId) -> Result<SeatGroup> {
        self.record("GET", &seat_group_path(id));
        self.state
            .lock()
            .unwrap()
            .seat_groups
            .iter()
            .find(|sg| sg.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(seat_group_path(id)))
    }

    async fn create_seat_group(
        &self,
        stage_id: StageId,
        data: &SeatGroupCreate,
    ) -> Result<SeatGroup> {
        self.record("POST", &stage_seat_groups_path(stage_id));
        let mut state = self.state.lock().unwrap();
        let seat_group = SeatGroup {
            id: state.next_id(),
            stage_id,
            capacity: data.capacity,
        };
        state.seat_groups.push(seat_group.clone());
        Ok(seat_group)
    }

    async fn update_seat_group(
        &self,
        id: SeatGroupId,
        data: &SeatGroupUpdate,
    ) -> Result<SeatGroup> {
        self.record("PUT", &seat_group_path(id));
        let mut state = self.state.lock().unwrap();
        let seat_group = state
            .seat_groups
            .iter_mut()
            .find(|sg| sg.id == id)
            .ok_or_else(|| KakuhoError::NotFound(seat_group_path(id)))?;
        if let Some(capacity) = data.capacity {
            seat_group.capacity = capacity;
        }
        Ok(seat_group.clone())
    }

    async fn delete_seat_group(&self, id: SeatGroupId) -> Result<()> {
        self.record("DELETE", &seat_group_path(id));
        let mut state = self.state.lock().unwrap();
        Self::remove(&mut state.seat_groups, seat_group_path(id), |sg| sg.id == id)
    }

    async fn list_ticket_types(&self) -> Result<Vec<TicketType>> {
        self.record("GET", Routes::TICKET_TYPES);
        Ok(self.state.lock().unwrap().ticket_types.clone())
    }

    async fn list_seat_group_ticket_types(
        &self,
        seat_group_id: SeatGroupId,
    ) -> Result<Vec<TicketType>> {
        self.record("GET", &seat_group_ticket_types_path(seat_group_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .ticket_types
            .iter()
            .filter(|tt| tt.seat_group_id == seat_group_id)
            .cloned()
            .collect())
    }

    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketType> {
        self.record("GET", &ticket_type_path(id));
        self.state
            .lock()
            .unwrap()
            .ticket_types
            .iter()
            .find(|tt| tt.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(ticket_type_path(id)))
    }

    async fn create_ticket_type(
        &self,
        seat_group_id: SeatGroupId,
        data: &TicketTypeCreate,
    ) -> Result<TicketType> {
        self.record("POST", &seat_group_ticket_types_path(seat_group_id));
        let mut state = self.state.lock().unwrap();
        let ticket_type = TicketType {
            id: state.next_id(),
            seat_group_id,
            type_name: data.type_name.clone(),
            price: data.price,
        };
        state.ticket_types.push(ticket_type.clone());
        Ok(ticket_type)
    }

    async fn update_ticket_type(
        &self,
        id: TicketTypeId,
        data: &TicketTypeUpdate,
    ) -> Result<TicketType> {
        self.record("PUT", &ticket_type_path(id));
        let mut state = self.state.lock().unwrap();
        let ticket_type = state
            .ticket_types
            .iter_mut()
            .find(|tt| tt.id == id)
            .ok_or_else(|| KakuhoError::NotFound(ticket_type_path(id)))?;
        if let Some(type_name) = &data.type_name {
            ticket_type.type_name = type_name.clone();
        }
        if let Some(price) = data.price {
            ticket_type.price = price;
        }
        Ok(ticket_type.clone())
    }

    async fn delete_ticket_type(&self, id: TicketTypeId) -> Result<()> {
        self.record("DELETE", &ticket_type_path(id));
        let mut state = self.state.lock().unwrap();
        Self::remove(&mut state.ticket_types, ticket_type_path(id), |tt| tt.id == id)
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>> {
        self.record("GET", Routes::RESERVATIONS);
        Ok(self.state.lock().unwrap().reservations.clone())
    }

    async fn list_user_reservations(&self, user_id: UserId) -> Result<Vec<Reservation>> {
        self.record("GET", &user_reservations_path(user_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_ticket_type_reservations(
        &self,
        ticket_type_id: TicketTypeId,
    ) -> Result<Vec<Reservation>> {
        self.record("GET", &ticket_type_reservations_path(ticket_type_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .filter(|r| r.ticket_type_id == ticket_type_id)
            .cloned()
            .collect())
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.record("GET", &reservation_path(id));
        self.reservation(id)
            .ok_or_else(|| KakuhoError::NotFound(reservation_path(id)))
    }

    async fn create_reservation(
        &self,
        ticket_type_id: TicketTypeId,
        data: &ReservationCreate,
    ) -> Result<Reservation> {
        let path = ticket_type_reservations_path(ticket_type_id);
        self.record("POST", &path);

        if self
            .failing_ticket_types
            .lock()
            .unwrap()
            .contains(&ticket_type_id)
        {
            return Err(KakuhoError::Api {
                status: 400,
                message: "Bad Request".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let seat_group = state.seat_group_of(ticket_type_id)?;
        if seat_group.capacity < data.num_attendees {
            return Err(KakuhoError::Api {
                status: 400,
                message: "Not enough seats".to_string(),
            });
        }
        seat_group.capacity -= data.num_attendees;

        let reservation = Reservation {
            id: state.next_id(),
            ticket_type_id,
            user_id: data.user_id,
            num_attendees: data.num_attendees,
            is_paid: data.is_paid.unwrap_or(false),
            created_at: now_jst(),
        };
        state.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        data: &ReservationUpdate,
    ) -> Result<Reservation> {
        let path = reservation_path(id);
        self.record("PUT", &path);

        let mut state = self.state.lock().unwrap();
        let current = state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(path.clone()))?;

        if let Some(num_attendees) = data.num_attendees {
            let seat_group = state.seat_group_of(current.ticket_type_id)?;
            let available = seat_group.capacity + current.num_attendees;
            if num_attendees > available {
                return Err(KakuhoError::Api {
                    status: 400,
                    message: "Not enough seats".to_string(),
                });
            }
            seat_group.capacity = available - num_attendees;
        }

        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(KakuhoError::NotFound(path))?;
        if let Some(num_attendees) = data.num_attendees {
            reservation.num_attendees = num_attendees;
        }
        if let Some(is_paid) = data.is_paid {
            reservation.is_paid = is_paid;
        }
        Ok(reservation.clone())
    }

    async fn delete_reservation(&self, id: ReservationId) -> Result<()> {
        let path = reservation_path(id);
        self.record("DELETE", &path);

        let mut state = self.state.lock().unwrap();
        let reservation = state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(path.clone()))?;
        state.seat_group_of(reservation.ticket_type_id)?.capacity += reservation.num_attendees;
        Self::remove(&mut state.reservations, path, |r| r.id == id)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.record("GET", Routes::USERS);
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        self.record("GET", &user_path(id));
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| KakuhoError::NotFound(user_path(id)))
    }

    async fn update_user(&self, id: UserId, data: &UserUpdate) -> Result<User> {
        self.record("PUT", &user_path(id));
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| KakuhoError::NotFound(user_path(id)))?;
        if let Some(email) = &data.email {
            user.email = email.clone();
        }
        if let Some(nickname) = &data.nickname {
            user.nickname = Some(nickname.clone());
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.record("DELETE", &user_path(id));
        let mut state = self.state.lock().unwrap();
        Self::remove(&mut state.users, user_path(id), |u| u.id == id)
    }
}
