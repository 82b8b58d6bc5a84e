pub mod event;
pub mod reservation;
pub mod routes;
pub mod seating;
pub mod time;
pub mod user;

pub use event::*;
pub use reservation::*;
pub use routes::*;
pub use seating::*;
pub use time::{jst, now_jst, parse_timestamp, Timestamp};
pub use user::*;
