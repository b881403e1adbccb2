//! Merge server-sourced and locally cached messages into one ordered history.
//!
//! Dedup key is the message `id`; the server copy always wins. Sequenced
//! messages are ordered by `sequence_number`. Unsequenced (never synced)
//! messages are slotted in by `created_at`, ahead of the first sequenced
//! message created after them. Ties break on `id` so the output is a pure
//! function of the input sets, which makes merging idempotent.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::Message;

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;

/// Merged history plus bookkeeping counts.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub messages: Vec<Message>,
    /// Distinct messages contributed by the server set.
    pub from_server: usize,
    /// Local messages kept because the server set lacked them.
    pub local_only: usize,
    /// Local copies discarded because the server had the same id.
    pub duplicates_removed: usize,
}

/// Merge `server` and `local` into a single deduplicated, ordered sequence.
#[must_use]
pub fn merge(server: Vec<Message>, local: Vec<Message>) -> MergeOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(server.len() + local.len());
    let mut sequenced = Vec::new();
    let mut unsequenced = Vec::new();

    let mut from_server = 0;
    for msg in server {
        if seen.insert(msg.id.clone()) {
            from_server += 1;
            bucket(msg, &mut sequenced, &mut unsequenced);
        }
    }

    let server_ids = seen.clone();
    let mut local_only = 0;
    let mut duplicates_removed = 0;
    for msg in local {
        if server_ids.contains(&msg.id) {
            duplicates_removed += 1;
        } else if seen.insert(msg.id.clone()) {
            local_only += 1;
            bucket(msg, &mut sequenced, &mut unsequenced);
        }
    }

    sequenced.sort_by(by_sequence);
    unsequenced.sort_by(by_created_at);

    MergeOutcome {
        messages: interleave(sequenced, unsequenced),
        from_server,
        local_only,
        duplicates_removed,
    }
}

fn bucket(msg: Message, sequenced: &mut Vec<Message>, unsequenced: &mut Vec<Message>) {
    if msg.sequence_number.is_some() {
        sequenced.push(msg);
    } else {
        unsequenced.push(msg);
    }
}

fn by_sequence(a: &Message, b: &Message) -> Ordering {
    a.sequence_number
        .cmp(&b.sequence_number)
        .then_with(|| a.id.cmp(&b.id))
}

fn by_created_at(a: &Message, b: &Message) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Two-way merge: an unsequenced message goes before a sequenced one only if
/// it was created strictly earlier.
fn interleave(sequenced: Vec<Message>, unsequenced: Vec<Message>) -> Vec<Message> {
    let mut out = Vec::with_capacity(sequenced.len() + unsequenced.len());
    let mut seq = sequenced.into_iter().peekable();
    let mut loose = unsequenced.into_iter().peekable();

    loop {
        let take_loose = match (seq.peek(), loose.peek()) {
            (Some(s), Some(l)) => l.created_at < s.created_at,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (None, None) => break,
        };
        let next = if take_loose { loose.next() } else { seq.next() };
        if let Some(msg) = next {
            out.push(msg);
        }
    }
    out
}
