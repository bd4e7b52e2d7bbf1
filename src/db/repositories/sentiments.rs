use anyhow::{anyhow, ensure, Context, Result};
use chrono::Local;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_timestamp, parse_sentiment, to_i64, to_u64},
    models::{HistoryEntry, SentimentRecord},
    Database,
};
use crate::models::SentimentLabel;

const ENABLE_LOGS: bool = true;

/// Window shown by the history panel.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

fn row_to_record(row: &Row) -> Result<SentimentRecord> {
    let sentiment: String = row.get("sentiment")?;

    Ok(SentimentRecord {
        id: row.get("id")?,
        text: row.get("text")?,
        sentiment: parse_sentiment(&sentiment)?,
        timestamp: row.get("timestamp")?,
    })
}

fn row_to_history_entry(row: &Row) -> Result<HistoryEntry> {
    let sentiment: String = row.get("sentiment")?;

    Ok(HistoryEntry {
        timestamp: row.get("timestamp")?,
        text: row.get("text")?,
        sentiment: parse_sentiment(&sentiment)?,
    })
}

impl Database {
    /// Append a classification result stamped with the current local time.
    pub fn append_sentiment(&self, text: &str, sentiment: SentimentLabel) -> Result<SentimentRecord> {
        let timestamp = format_timestamp(&Local::now());
        self.append_sentiment_at(text, sentiment, &timestamp)
    }

    pub(crate) fn append_sentiment_at(
        &self,
        text: &str,
        sentiment: SentimentLabel,
        timestamp: &str,
    ) -> Result<SentimentRecord> {
        ensure!(!text.trim().is_empty(), "refusing to store an empty text");

        let record = self
            .execute(|conn| {
                conn.execute(
                    "INSERT INTO sentiments (text, sentiment, timestamp) VALUES (?1, ?2, ?3)",
                    params![text, sentiment.as_str(), timestamp],
                )
                .context("failed to insert sentiment")?;

                let id = conn.last_insert_rowid();

                let mut stmt = conn.prepare(
                    "SELECT id, text, sentiment, timestamp
                     FROM sentiments
                     WHERE id = ?1",
                )?;
                let mut rows = stmt.query(params![id])?;
                let record = match rows.next()? {
                    Some(row) => row_to_record(row)?,
                    None => return Err(anyhow!("sentiment {id} not found after insert")),
                };

                Ok(record)
            })
            .map_err(|err| {
                crate::log_error!("Failed to store sentiment: {err:#}");
                err
            })?;

        crate::log_info!("Stored sentiment #{} as {}", record.id, record.sentiment);
        Ok(record)
    }

    /// Up to `limit` most recent entries, newest first.
    ///
    /// Entries sharing a timestamp come back in reverse insertion order.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = to_i64(limit)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, text, sentiment
                 FROM sentiments
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_history_entry(row)?);
            }

            Ok(entries)
        })
    }

    pub fn count_sentiments(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM sentiments", [], |row| row.get(0))?;
            to_u64(count, "row count")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn append_returns_stored_record() {
        let (_dir, db) = open_store();

        let record = db
            .append_sentiment("Hôm nay tôi rất vui", SentimentLabel::Positive)
            .unwrap();

        assert!(record.id > 0);
        assert_eq!(record.text, "Hôm nay tôi rất vui");
        assert_eq!(record.sentiment, SentimentLabel::Positive);
        assert_eq!(record.timestamp.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert!(crate::db::helpers::parse_timestamp(&record.timestamp, "timestamp").is_ok());
        assert_eq!(db.count_sentiments().unwrap(), 1);
    }

    #[test]
    fn ids_increase_monotonically() {
        let (_dir, db) = open_store();

        let first = db.append_sentiment("một hai ba", SentimentLabel::Neutral).unwrap();
        let second = db.append_sentiment("bốn năm sáu", SentimentLabel::Neutral).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn empty_text_is_refused() {
        let (_dir, db) = open_store();

        assert!(db.append_sentiment("   ", SentimentLabel::Unknown).is_err());
        assert_eq!(db.count_sentiments().unwrap(), 0);
    }

    #[test]
    fn history_is_newest_first() {
        let (_dir, db) = open_store();
        db.append_sentiment_at("sáng nay trời đẹp", SentimentLabel::Positive, "2024-01-02 08:00:00")
            .unwrap();
        db.append_sentiment_at("tối qua mất điện", SentimentLabel::Negative, "2024-01-01 20:00:00")
            .unwrap();
        db.append_sentiment_at("trưa nay ăn phở", SentimentLabel::Neutral, "2024-01-02 12:30:00")
            .unwrap();

        let history = db.recent_history(DEFAULT_HISTORY_LIMIT).unwrap();

        let stamps: Vec<&str> = history.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec!["2024-01-02 12:30:00", "2024-01-02 08:00:00", "2024-01-01 20:00:00"]
        );
        assert_eq!(history[0].text, "trưa nay ăn phở");
        assert_eq!(history[0].sentiment, SentimentLabel::Neutral);
    }

    #[test]
    fn same_second_ties_favor_latest_insert() {
        let (_dir, db) = open_store();
        db.append_sentiment_at("câu thứ nhất", SentimentLabel::Positive, "2024-06-01 10:00:00")
            .unwrap();
        db.append_sentiment_at("câu thứ hai", SentimentLabel::Negative, "2024-06-01 10:00:00")
            .unwrap();

        let history = db.recent_history(1).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "câu thứ hai");
    }

    #[test]
    fn history_is_capped_by_limit() {
        let (_dir, db) = open_store();
        for i in 0..60 {
            let timestamp = format!("2024-02-01 10:{:02}:{:02}", i / 60, i % 60);
            db.append_sentiment_at(&format!("câu số {i}"), SentimentLabel::Neutral, &timestamp)
                .unwrap();
        }

        let history = db.recent_history(DEFAULT_HISTORY_LIMIT).unwrap();

        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history[0].text, "câu số 59");
        assert_eq!(db.count_sentiments().unwrap(), 60);
    }

    #[test]
    fn short_store_returns_everything() {
        let (_dir, db) = open_store();
        assert!(db.recent_history(DEFAULT_HISTORY_LIMIT).unwrap().is_empty());

        let record = db.append_sentiment("chỉ một dòng", SentimentLabel::Unknown).unwrap();
        let history = db.recent_history(DEFAULT_HISTORY_LIMIT).unwrap();

        assert_eq!(
            history,
            vec![HistoryEntry {
                timestamp: record.timestamp,
                text: record.text,
                sentiment: record.sentiment,
            }]
        );
    }

    #[test]
    fn zero_limit_returns_nothing() {
        let (_dir, db) = open_store();
        db.append_sentiment("có dữ liệu", SentimentLabel::Positive).unwrap();

        assert!(db.recent_history(0).unwrap().is_empty());
    }

    #[test]
    fn foreign_labels_in_the_table_are_reported() {
        let (_dir, db) = open_store();
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO sentiments (text, sentiment, timestamp) VALUES ('lạ lắm', 'MIXED', '2024-01-01 00:00:00')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.recent_history(DEFAULT_HISTORY_LIMIT).is_err());
    }
}
