//! # Tweet Parsing
//!
//! Turns author-pasted embed markup into a [`Tweet`].
//!
//! ```text
//! <blockquote><a href="https://twitter.com/user/status/123">…</a></blockquote>
//!                                                      ↓
//! Tweet { id: Some("123"), markup: "<div><blockquote>…</blockquote></div>" }
//! ```
//!
//! Parsing is total. Markup that yields no id still produces a `Tweet` with
//! `id: None`, so the embed can be inserted anyway.

use crate::error::IdError;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Numeric tweet identifier (non-empty, ASCII digits only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TweetId(String);

impl TweetId {
    /// Validate `candidate` as a tweet id
    pub fn new(candidate: &str) -> Option<Self> {
        if !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TweetId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or(IdError::NotNumeric(value))
    }
}

impl From<TweetId> for String {
    fn from(id: TweetId) -> Self {
        id.0
    }
}

/// Parsed embed: extracted id plus the markup re-wrapped in one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: Option<TweetId>,
    pub markup: String,
}

/// Parse raw embed markup. Never fails; see [`try_extract_id`] for the reasons
/// an id can be missing.
pub fn parse(raw: &str) -> Tweet {
    let fragment = Html::parse_fragment(raw);

    let id = match try_extract_id(&fragment) {
        Ok(id) => {
            debug!(tweet_id = %id, "Parsed tweet embed");
            Some(id)
        }
        Err(err) => {
            warn!(error = %err, "Tweet id was not parsed; embedding without one");
            None
        }
    };

    Tweet {
        id,
        markup: normalize(&fragment),
    }
}

/// Read the tweet id from the first link anywhere in the fragment
pub fn try_extract_id(fragment: &Html) -> Result<TweetId, IdError> {
    let anchor = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .ok_or(IdError::NoAnchor)?;

    let href = anchor.value().attr("href").ok_or(IdError::MissingHref)?;
    let segment = last_path_segment(href);

    TweetId::new(segment).ok_or_else(|| IdError::not_numeric(segment))
}

/// Pure form of the id rule, applied to an href directly
pub fn extract_tweet_id(href: &str) -> Option<TweetId> {
    TweetId::new(last_path_segment(href))
}

fn last_path_segment(href: &str) -> &str {
    let path = href
        .find(|c| c == '?' || c == '#')
        .map_or(href, |end| &href[..end]);

    path.rsplit('/').next().unwrap_or_default()
}

/// Wrap every top-level node in a single `<div>` so multi-root fragments
/// serialize as one element
fn normalize(fragment: &Html) -> String {
    format!("<div>{}</div>", fragment.root_element().inner_html())
}
