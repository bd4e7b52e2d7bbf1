pub mod sentiment;

pub use sentiment::SentimentLabel;
