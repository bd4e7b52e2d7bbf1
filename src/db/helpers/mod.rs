use std::convert::TryFrom;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime};

use crate::models::SentimentLabel;

/// Second precision, no zone marker. Lexical order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn format_timestamp(value: &DateTime<Local>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|err| anyhow!("failed to parse {field} '{value}': {err}"))
}

pub fn parse_sentiment(value: &str) -> Result<SentimentLabel> {
    value.parse::<SentimentLabel>().map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_use_second_precision() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09 07:05:01");
    }

    #[test]
    fn formatted_timestamps_parse_back() {
        let parsed = parse_timestamp("2024-12-31 23:59:59", "timestamp").unwrap();
        assert_eq!(parsed.format(TIMESTAMP_FORMAT).to_string(), "2024-12-31 23:59:59");
        assert!(parse_timestamp("2024-12-31T23:59:59Z", "timestamp").is_err());
    }

    #[test]
    fn stored_sentiment_must_be_in_closed_set() {
        assert_eq!(parse_sentiment("NEUTRAL").unwrap(), SentimentLabel::Neutral);
        assert!(parse_sentiment("NEU").is_err());
    }
}
