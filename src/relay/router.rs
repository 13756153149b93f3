//! Keyword matching for channel posts.
//!
//! The post text is lowercased once, then each topic's keyword list is scanned
//! in order. The first hit selects the topic and ends that topic's scan, so
//! multiple matching keywords within one topic never produce duplicate
//! forwards. Other topics are still scanned, so one post can fan out to
//! several threads. The actual copy calls live in the server, which needs the
//! API handle and the admin list for failure notices.

use std::collections::BTreeMap;

use crate::storage::Topic;

/// Names of topics whose keywords match `text`, in table order.
pub fn matching_topics<'a>(text: &str, topics: &'a BTreeMap<String, Topic>) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    topics
        .iter()
        .filter_map(|(name, topic)| {
            let hit = topic
                .keywords
                .iter()
                .any(|keyword| lower.contains(&keyword.to_lowercase()));
            hit.then_some(name.as_str())
        })
        .collect()
}
