use chrono::{DateTime, NaiveDate, Utc};

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Calendar day (UTC) a block time falls on.
pub fn day_of(block_time: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(block_time, 0).map(|dt| dt.date_naive())
}

/// Unix seconds of 00:00 UTC on `day`.
pub fn day_start_timestamp(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    DateTime::from_timestamp(day_start_timestamp(day), 0).unwrap_or_default()
}

pub fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_KEY_FORMAT).ok()
}

/// Date fields in exported documents are written as `{"$date": "<RFC 3339>"}`.
/// Reading accepts that wrapper or a bare RFC 3339 string.
pub mod wrapped_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Wrapped<'a> {
        #[serde(rename = "$date")]
        date: &'a str,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Wrapped {
            #[serde(rename = "$date")]
            date: String,
        },
        Plain(String),
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let date = value.to_rfc3339_opts(SecondsFormat::Millis, true);
        Wrapped { date: &date }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match RawDate::deserialize(deserializer)? {
            RawDate::Wrapped { date } => date,
            RawDate::Plain(date) => date,
        };

        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid date `{}`: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Doc {
        #[serde(with = "wrapped_date")]
        timestamp: DateTime<Utc>,
    }

    #[test]
    fn test_day_of_truncates_to_utc_day() {
        // 2024-03-05T23:59:59Z and 2024-03-06T00:00:00Z
        assert_eq!(day_of(1709683199), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(day_of(1709683200), NaiveDate::from_ymd_opt(2024, 3, 6));
    }

    #[test]
    fn test_day_start_timestamp() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(day_start_timestamp(day), 1704067200);
    }

    #[test]
    fn test_wrapped_date_serializes_with_marker() {
        let doc = Doc {
            timestamp: DateTime::from_timestamp(1704067200, 0).unwrap(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["timestamp"]["$date"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_wrapped_date_reads_both_forms() {
        let wrapped: Doc =
            serde_json::from_str(r#"{"timestamp": {"$date": "2024-01-01T00:00:00Z"}}"#).unwrap();
        let plain: Doc = serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00+00:00"}"#).unwrap();

        assert_eq!(wrapped.timestamp, plain.timestamp);
        assert_eq!(wrapped.timestamp.timestamp(), 1704067200);
    }
}
