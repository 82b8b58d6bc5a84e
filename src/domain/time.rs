use crate::{KakuhoError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// All timestamps exchanged with the server are Japan Standard Time.
pub type Timestamp = DateTime<FixedOffset>;

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Wire format for timestamps sent to the server (naive, JST wall clock).
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

pub fn now_jst() -> Timestamp {
    Utc::now().with_timezone(&jst())
}

/// Parse a server timestamp. Strings without an offset are JST wall-clock time.
pub fn parse_timestamp(timestamp_str: &str) -> Result<Timestamp> {
    let trimmed = timestamp_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&jst()));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            if let Some(dt) = jst().from_local_datetime(&naive).single() {
                return Ok(dt);
            }
        }
    }

    if let Ok(millis) = trimmed.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp_millis(millis) {
            return Ok(dt.with_timezone(&jst()));
        }
    }

    Err(KakuhoError::InvalidArgument(format!(
        "Invalid timestamp format: {}",
        timestamp_str
    )))
}

pub fn to_wire(dt: &Timestamp) -> String {
    dt.with_timezone(&jst()).format(WIRE_FORMAT).to_string()
}

/// Serde adapter for [`Timestamp`] fields.
pub mod wire {
    use super::{parse_timestamp, to_wire, Timestamp};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &Timestamp, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_wire(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::super::{parse_timestamp, to_wire, Timestamp};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(
            dt: &Option<Timestamp>,
            serializer: S,
        ) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match dt {
                Some(dt) => serializer.serialize_some(&to_wire(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> std::result::Result<Option<Timestamp>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
