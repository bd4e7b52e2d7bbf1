pub mod sentiment_record;

pub use sentiment_record::{HistoryEntry, SentimentRecord};
