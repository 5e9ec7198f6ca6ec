pub mod error;
pub mod tweet;


pub use error::IdError;
pub use tweet::{extract_tweet_id, parse, try_extract_id, Tweet, TweetId};
