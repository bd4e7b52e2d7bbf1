pub mod sentiments;

pub use sentiments::DEFAULT_HISTORY_LIMIT;
