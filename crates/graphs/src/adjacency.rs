//! Binary layout for one vertex's adjacency blob (`SPEC_FULL.md` §4.4).
//!
//! Directed graphs store out-edges and in-edges as two separate segments
//! within the same blob; undirected graphs use a single segment mirrored
//! on both endpoints. Each segment is a flat sequence of `(neighbor, edge_id)`
//! pairs, 16 bytes each, little-endian.

use byteorder::{ByteOrder, LittleEndian};
use ukv_core::Key;

/// One incident edge: the neighbor vertex and the edge's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Incidence {
    /// The vertex at the other end of the edge.
    pub neighbor: Key,
    /// Parallel-edge disambiguator.
    pub edge_id: Key,
}

const ENTRY_BYTES: usize = 16;

fn encode_segment(out: &mut Vec<u8>, entries: &[Incidence]) {
    let mut header = [0u8; 4];
    LittleEndian::write_u32(&mut header, entries.len() as u32);
    out.extend_from_slice(&header);
    for entry in entries {
        let mut buf = [0u8; ENTRY_BYTES];
        LittleEndian::write_i64(&mut buf[0..8], entry.neighbor);
        LittleEndian::write_i64(&mut buf[8..16], entry.edge_id);
        out.extend_from_slice(&buf);
    }
}

fn decode_segment(bytes: &[u8], cursor: &mut usize) -> Vec<Incidence> {
    if *cursor + 4 > bytes.len() {
        return Vec::new();
    }
    let count = LittleEndian::read_u32(&bytes[*cursor..*cursor + 4]) as usize;
    *cursor += 4;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let neighbor = LittleEndian::read_i64(&bytes[*cursor..*cursor + 8]);
        let edge_id = LittleEndian::read_i64(&bytes[*cursor + 8..*cursor + 16]);
        entries.push(Incidence { neighbor, edge_id });
        *cursor += ENTRY_BYTES;
    }
    entries
}

/// A vertex's adjacency record: out-edges and in-edges are tracked
/// separately so directed graphs can answer "edges-from"/"edges-to"
/// independently. Undirected graphs only ever populate `out` and treat it
/// as the vertex's one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexRecord {
    /// Out-going incident edges (or the sole segment for undirected graphs).
    pub out: Vec<Incidence>,
    /// In-coming incident edges (empty for undirected graphs).
    pub in_: Vec<Incidence>,
}

impl VertexRecord {
    /// Parse a vertex blob. An empty blob decodes to an empty record.
    pub fn decode(bytes: &[u8]) -> VertexRecord {
        if bytes.is_empty() {
            return VertexRecord::default();
        }
        let mut cursor = 0;
        let out = decode_segment(bytes, &mut cursor);
        let in_ = decode_segment(bytes, &mut cursor);
        VertexRecord { out, in_ }
    }

    /// Serialize back to the blob layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode_segment(&mut out, &self.out);
        encode_segment(&mut out, &self.in_);
        out
    }

    /// Total incident edge count (§4.4 "degree").
    pub fn degree(&self) -> usize {
        self.out.len() + self.in_.len()
    }

    /// Add `incidence` to `out` if an identical `(neighbor, edge_id)` pair
    /// isn't already present (§4.4 "Duplicate control").
    pub fn add_out(&mut self, incidence: Incidence) {
        if !self.out.contains(&incidence) {
            self.out.push(incidence);
        }
    }

    /// Add `incidence` to `in_` if not already present.
    pub fn add_in(&mut self, incidence: Incidence) {
        if !self.in_.contains(&incidence) {
            self.in_.push(incidence);
        }
    }

    /// Remove edges to `neighbor`; `edge_id: None` removes every parallel
    /// edge to that neighbor, `Some(id)` removes only the matching one.
    /// Returns the edge ids actually removed.
    pub fn remove_out(&mut self, neighbor: Key, edge_id: Option<Key>) -> Vec<Key> {
        remove_matching(&mut self.out, neighbor, edge_id)
    }

    /// Mirror of [`VertexRecord::remove_out`] for the in-edge segment.
    pub fn remove_in(&mut self, neighbor: Key, edge_id: Option<Key>) -> Vec<Key> {
        remove_matching(&mut self.in_, neighbor, edge_id)
    }
}

fn remove_matching(entries: &mut Vec<Incidence>, neighbor: Key, edge_id: Option<Key>) -> Vec<Key> {
    let mut removed = Vec::new();
    entries.retain(|entry| {
        let matches = entry.neighbor == neighbor && edge_id.map_or(true, |id| id == entry.edge_id);
        if matches {
            removed.push(entry.edge_id);
        }
        !matches
    });
    removed
}
