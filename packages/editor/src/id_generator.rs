use embedtweet_common::BlockId;
use embedtweet_parser::TweetId;

/// Sequential id generator for embedded blocks within one editing session
///
/// Ids are `<prefix>-<n>-<tweet id>`, or `<prefix>-<n>` when the tweet id is
/// unknown. The counter only ever grows, so ids stay unique even when the
/// same tweet is embedded several times.
#[derive(Debug, Clone)]
pub struct BlockIdGenerator {
    prefix: String,
    count: u64,
}

impl BlockIdGenerator {
    pub fn new() -> Self {
        Self::with_prefix("tweet")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn next_id(&mut self, tweet_id: Option<&TweetId>) -> BlockId {
        self.count += 1;

        match tweet_id {
            Some(tweet_id) => BlockId::new(format!("{}-{}-{}", self.prefix, self.count, tweet_id)),
            None => BlockId::new(format!("{}-{}", self.prefix, self.count)),
        }
    }

    /// Number of ids handed out so far
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Default for BlockIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
