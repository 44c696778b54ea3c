//! Chunk order bookkeeping, so a file is written back in the order it was read.
//!
//! Two strategies are offered. [`ChunkOrder`] records every tag and replays
//! the sequence, for files whose chunk set varies (ADT). [`Anchors`] ties
//! each unknown chunk to the known chunk it followed, for files written in a
//! fixed order (WMO).

use crate::chunk::{Chunk, ChunkTag};

/// Tags in the order they were met while reading.
///
/// A freshly built file has an empty order and is written in the format's
/// canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOrder(Vec<ChunkTag>);

impl ChunkOrder {
    pub fn record(&mut self, tag: ChunkTag) {
        self.0.push(tag);
    }

    pub fn tags(&self) -> &[ChunkTag] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded order, with every canonical tag never seen slotted in
    /// ahead of the first recorded tag that follows it canonically.
    pub fn plan(&self, canonical: &[ChunkTag]) -> Vec<ChunkTag> {
        let unseen: Vec<ChunkTag> = canonical
            .iter()
            .copied()
            .filter(|tag| !self.0.contains(tag))
            .collect();
        let mut plan = Vec::with_capacity(self.0.len() + unseen.len());
        for &tag in &self.0 {
            if let Some(rank) = canonical.iter().position(|t| *t == tag) {
                let before = canonical[..rank]
                    .iter()
                    .filter(|t| unseen.contains(t) && !plan.contains(*t))
                    .copied()
                    .collect::<Vec<_>>();
                plan.extend(before);
            }
            plan.push(tag);
        }
        let rest: Vec<ChunkTag> = unseen.into_iter().filter(|t| !plan.contains(t)).collect();
        plan.extend(rest);
        plan
    }
}

/// Unknown chunks waiting to be written at the slot of their tag.
pub struct PendingExtras<'a> {
    chunks: &'a [Chunk],
    written: Vec<bool>,
}

impl<'a> PendingExtras<'a> {
    pub fn new(chunks: &'a [Chunk]) -> Self {
        Self {
            chunks,
            written: vec![false; chunks.len()],
        }
    }

    /// The first unwritten chunk carrying `tag`.
    pub fn take(&mut self, tag: ChunkTag) -> Option<&'a Chunk> {
        let index = self
            .chunks
            .iter()
            .enumerate()
            .position(|(i, c)| !self.written[i] && c.tag == tag)?;
        self.written[index] = true;
        Some(&self.chunks[index])
    }

    /// Chunks no slot asked for, in their original order.
    pub fn rest(self) -> impl Iterator<Item = &'a Chunk> {
        self.chunks
            .iter()
            .zip(self.written)
            .filter_map(|(chunk, written)| (!written).then_some(chunk))
    }
}

/// A known chunk position: its tag and which occurrence of that tag it is.
pub type Anchor = (ChunkTag, usize);

/// An unknown chunk and the known chunk it followed, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredChunk {
    pub after: Option<Anchor>,
    pub chunk: Chunk,
}

impl AnchoredChunk {
    /// An unknown chunk with no anchor; it is written after the known ones.
    pub fn trailing(chunk: Chunk) -> Self {
        Self { after: None, chunk }
    }
}

/// Counts known chunks as they are read or written.
#[derive(Debug, Clone, Default)]
pub struct Anchors {
    last: Option<Anchor>,
    counts: Vec<(ChunkTag, usize)>,
}

impl Anchors {
    /// Note a known chunk and return its position.
    pub fn known(&mut self, tag: ChunkTag) -> Anchor {
        let nth = match self.counts.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, count)) => {
                *count += 1;
                *count - 1
            }
            None => {
                self.counts.push((tag, 1));
                0
            }
        };
        self.last = Some((tag, nth));
        (tag, nth)
    }

    /// Tie `chunk` to the last known chunk seen.
    pub fn anchor(&self, chunk: Chunk) -> AnchoredChunk {
        AnchoredChunk {
            after: self.last,
            chunk,
        }
    }

    /// Whether the known chunk `extra` hangs off has been seen.
    pub fn placed(&self, extra: &AnchoredChunk) -> bool {
        extra.after.is_some_and(|(tag, nth)| {
            self.counts
                .iter()
                .any(|(t, count)| *t == tag && *count > nth)
        })
    }
}

/// The chunks of `extras` anchored right after `at`, in their read order.
pub fn anchored_after(extras: &[AnchoredChunk], at: Anchor) -> impl Iterator<Item = &Chunk> {
    extras
        .iter()
        .filter(move |extra| extra.after == Some(at))
        .map(|extra| &extra.chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const A: ChunkTag = ChunkTag::new(b"MAAA");
    const B: ChunkTag = ChunkTag::new(b"MBBB");
    const C: ChunkTag = ChunkTag::new(b"MCCC");
    const D: ChunkTag = ChunkTag::new(b"MDDD");
    const X: ChunkTag = ChunkTag::new(b"MXYZ");

    #[test]
    fn empty_order_is_canonical() {
        assert_eq!(ChunkOrder::default().plan(&[A, B, C]), vec![A, B, C]);
    }

    #[test]
    fn unseen_tags_slot_in_canonically() {
        let mut order = ChunkOrder::default();
        for tag in [A, X, C] {
            order.record(tag);
        }
        assert_eq!(order.plan(&[A, B, C, D]), vec![A, X, B, C, D]);
    }

    #[test]
    fn repeated_tags_stay_repeated() {
        let mut order = ChunkOrder::default();
        for tag in [A, C, C, C] {
            order.record(tag);
        }
        assert_eq!(order.plan(&[A, B, C]), vec![A, B, C, C, C]);
    }

    #[test]
    fn anchors_count_repeated_tags() {
        let mut anchors = Anchors::default();
        anchors.known(A);
        let first = anchors.anchor(Chunk::new(X, vec![1]));
        assert_eq!(anchors.known(B), (B, 0));
        assert_eq!(anchors.known(B), (B, 1));
        let second = anchors.anchor(Chunk::new(X, vec![2]));
        assert_eq!(first.after, Some((A, 0)));
        assert_eq!(second.after, Some((B, 1)));

        let extras = [first, second];
        let mut replay = Anchors::default();
        replay.known(B);
        assert!(!replay.placed(&extras[1]));
        let at = replay.known(B);
        assert!(replay.placed(&extras[1]));
        assert!(!replay.placed(&extras[0]));
        let found: Vec<u8> = anchored_after(&extras, at).map(|c| c.data[0]).collect();
        assert_eq!(found, vec![2]);
    }

    #[test]
    fn extras_are_taken_by_tag_then_in_order() {
        let chunks = vec![Chunk::new(X, vec![1]), Chunk::new(A, vec![2]), Chunk::new(X, vec![3])];
        let mut pending = PendingExtras::new(&chunks);
        assert_eq!(pending.take(X).map(|c| c.data[0]), Some(1));
        assert_eq!(pending.take(X).map(|c| c.data[0]), Some(3));
        assert!(pending.take(X).is_none());
        let rest: Vec<u8> = pending.rest().map(|c| c.data[0]).collect();
        assert_eq!(rest, vec![2]);
    }
}
