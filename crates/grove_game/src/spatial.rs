//! Chunked broad phase for visibility and pickup queries.
//!
//! Space is cut into square chunks keyed by `(floor(x / size), floor(y / size))`.
//! An entry is bucketed once, by the chunk holding its top-left corner, so a
//! build is linear in the entry count whatever the rect sizes. A query widens
//! its chunk range on the low side by the largest entry extent seen, which
//! reaches every entry that could cross into the query from a lower chunk.
//! Results are exact: every candidate goes through `Rect::overlaps` and the
//! output is identical to a linear scan, in insertion order.

use std::collections::HashMap;

use glam::Vec2;
use grove_core::math::Rect;

pub const DEFAULT_CHUNK_SIZE: f32 = 512.0;
const MIN_CHUNK_SIZE: f32 = 1.0;

type ChunkCoord = (i32, i32);

pub struct SpatialIndex<K> {
    chunk_size: f32,
    entries: Vec<(K, Rect)>,
    chunks: HashMap<ChunkCoord, Vec<usize>>,
    max_extent: Vec2,
}

impl<K: Copy> SpatialIndex<K> {
    pub fn new(chunk_size: f32) -> Self {
        let chunk_size = if !chunk_size.is_finite() {
            log::warn!(
                "Chunk size {} is not finite, using {}",
                chunk_size,
                DEFAULT_CHUNK_SIZE
            );
            DEFAULT_CHUNK_SIZE
        } else if chunk_size < MIN_CHUNK_SIZE {
            log::warn!("Chunk size {} clamped to {}", chunk_size, MIN_CHUNK_SIZE);
            MIN_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            chunk_size,
            entries: Vec::new(),
            chunks: HashMap::new(),
            max_extent: Vec2::ZERO,
        }
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.chunks.clear();
        self.max_extent = Vec2::ZERO;
    }

    /// Drop everything and index `items` from scratch.
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (K, Rect)>) {
        self.clear();
        for (key, rect) in items {
            self.insert(key, rect);
        }
        log::debug!(
            "Spatial index rebuilt: {} entries in {} chunks",
            self.entries.len(),
            self.chunks.len()
        );
    }

    pub fn insert(&mut self, key: K, rect: Rect) {
        let index = self.entries.len();
        self.entries.push((key, rect));
        self.max_extent = self.max_extent.max(rect.size());
        let coord = (self.chunk_of(rect.x), self.chunk_of(rect.y));
        self.chunks.entry(coord).or_default().push(index);
    }

    /// Every entry whose rect strictly overlaps `area`, in insertion order.
    pub fn query(&self, area: Rect) -> Vec<K> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        // An overlapping entry has its corner in (area.min - max_extent, area.max).
        let (x0, x1) = self.chunk_span(area.x - self.max_extent.x, area.right());
        let (y0, y1) = self.chunk_span(area.y - self.max_extent.y, area.bottom());
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);

        let mut hits: Vec<usize> = Vec::new();
        let mut collect = |bucket: &[usize]| {
            hits.extend(
                bucket
                    .iter()
                    .copied()
                    .filter(|&i| self.entries[i].1.overlaps(&area)),
            );
        };

        // Huge query rects would walk mostly empty chunks; walk the buckets instead.
        if span > self.chunks.len() as i64 {
            for (&(cx, cy), bucket) in &self.chunks {
                if (x0..=x1).contains(&cx) && (y0..=y1).contains(&cy) {
                    collect(bucket);
                }
            }
        } else {
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    if let Some(bucket) = self.chunks.get(&(cx, cy)) {
                        collect(bucket);
                    }
                }
            }
        }

        hits.sort_unstable();
        hits.into_iter().map(|i| self.entries[i].0).collect()
    }

    /// Linear scan with the same overlap test as `query`.
    pub fn scan(&self, area: Rect) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, rect)| rect.overlaps(&area))
            .map(|(key, _)| *key)
            .collect()
    }

    fn chunk_of(&self, v: f32) -> i32 {
        (v / self.chunk_size).floor() as i32
    }

    fn chunk_span(&self, min: f32, max: f32) -> (i32, i32) {
        let first = self.chunk_of(min);
        (first, self.chunk_of(max).max(first))
    }
}
