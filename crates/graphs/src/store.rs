//! The graph modality facade (`SPEC_FULL.md` §4.4): vertices are blobs in
//! the underlying engine holding an encoded [`VertexRecord`]; edges are
//! never stored independently, only as mirrored incidences on their
//! endpoints.

use ukv_core::{CollectionId, Error, Key, Role, WriteValue, VERTEX_DEGREE_MISSING};
use ukv_storage::Engine;

use crate::adjacency::{Incidence, VertexRecord};

/// One edge as returned by [`GraphStore::find_edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Edge's source vertex.
    pub source: Key,
    /// Edge's target vertex.
    pub target: Key,
    /// Edge identifier.
    pub edge_id: Key,
}

/// [`GraphStore::find_edges`]'s per-vertex result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexEdges {
    /// The vertex queried.
    pub vertex: Key,
    /// Its degree, or [`VERTEX_DEGREE_MISSING`] if the vertex has no
    /// stored record at all.
    pub degree: u32,
    /// The flattened triplet list (`SPEC_FULL.md` §4.4 "find_edges").
    pub edges: Vec<Edge>,
}

/// The graph modality: directed or undirected multigraphs built on blob
/// storage, one blob per vertex (`SPEC_FULL.md` §4.4).
pub struct GraphStore<'engine> {
    engine: &'engine Engine,
    directed: bool,
}

impl<'engine> GraphStore<'engine> {
    /// Wrap `engine` for graph-modality access. `directed` selects whether
    /// edges are mirrored across separate in/out segments (directed) or a
    /// single shared segment (undirected).
    pub fn new(engine: &'engine Engine, directed: bool) -> GraphStore<'engine> {
        GraphStore { engine, directed }
    }

    fn load(&self, collection: CollectionId, vertex: Key) -> VertexRecord {
        match self.engine.read_one(collection, vertex, None) {
            Some(WriteValue::Value(bytes)) => VertexRecord::decode(&bytes),
            _ => VertexRecord::default(),
        }
    }

    fn store(&self, collection: CollectionId, vertex: Key, record: VertexRecord) {
        if record.degree() == 0 {
            self.engine.write_batch(&[(collection, vertex, WriteValue::Tombstone)]);
        } else {
            self.engine.write_batch(&[(collection, vertex, WriteValue::Value(record.encode()))]);
        }
    }

    /// Add each `(source, target, edge_id)` triplet, deduplicating reads
    /// when a vertex appears on both sides of the batch
    /// (`SPEC_FULL.md` §4.4 "upsert_edges").
    pub fn upsert_edges(&self, collection: CollectionId, edges: &[(Key, Key, Key)]) -> Result<(), Error> {
        for &(source, target, edge_id) in edges {
            let mut source_record = self.load(collection, source);
            if self.directed {
                source_record.add_out(Incidence { neighbor: target, edge_id });
                self.store(collection, source, source_record);
                let mut target_record = self.load(collection, target);
                target_record.add_in(Incidence { neighbor: source, edge_id });
                self.store(collection, target, target_record);
            } else if source == target {
                source_record.add_out(Incidence { neighbor: target, edge_id });
                self.store(collection, source, source_record);
            } else {
                source_record.add_out(Incidence { neighbor: target, edge_id });
                self.store(collection, source, source_record);
                let mut target_record = self.load(collection, target);
                target_record.add_out(Incidence { neighbor: source, edge_id });
                self.store(collection, target, target_record);
            }
        }
        tracing::debug!(collection = collection.0, edges = edges.len(), "graph upsert_edges");
        Ok(())
    }

    /// Remove each `(source, target, edge_id)` triplet; `edge_id: None`
    /// removes every parallel edge between the pair
    /// (`SPEC_FULL.md` §4.4 "remove_edges").
    pub fn remove_edges(&self, collection: CollectionId, edges: &[(Key, Key, Option<Key>)]) -> Result<(), Error> {
        for &(source, target, edge_id) in edges {
            let mut source_record = self.load(collection, source);
            if self.directed {
                source_record.remove_out(target, edge_id);
                self.store(collection, source, source_record);
                let mut target_record = self.load(collection, target);
                target_record.remove_in(source, edge_id);
                self.store(collection, target, target_record);
            } else if source == target {
                source_record.remove_out(target, edge_id);
                self.store(collection, source, source_record);
            } else {
                source_record.remove_out(target, edge_id);
                self.store(collection, source, source_record);
                let mut target_record = self.load(collection, target);
                target_record.remove_out(source, edge_id);
                self.store(collection, target, target_record);
            }
        }
        Ok(())
    }

    /// Cascade-remove `vertices`: delete the vertex records and every edge
    /// incident to them (filtered by `roles`), mirroring the removal onto
    /// affected neighbors. Returns, per vertex, the edge ids actually
    /// removed (`SPEC_FULL.md` §4.4 "remove_vertices").
    pub fn remove_vertices(&self, collection: CollectionId, vertices: &[Key], roles: Role) -> Result<Vec<(Key, Vec<Key>)>, Error> {
        let mut results = Vec::with_capacity(vertices.len());
        for &vertex in vertices {
            let record = self.load(collection, vertex);
            let mut removed = Vec::new();
            if matches!(roles, Role::Source | Role::Any) {
                for incidence in &record.out {
                    removed.push(incidence.edge_id);
                    let mut neighbor_record = self.load(collection, incidence.neighbor);
                    if self.directed {
                        neighbor_record.remove_in(vertex, Some(incidence.edge_id));
                    } else {
                        neighbor_record.remove_out(vertex, Some(incidence.edge_id));
                    }
                    self.store(collection, incidence.neighbor, neighbor_record);
                }
            }
            if self.directed && matches!(roles, Role::Target | Role::Any) {
                for incidence in &record.in_ {
                    removed.push(incidence.edge_id);
                    let mut neighbor_record = self.load(collection, incidence.neighbor);
                    neighbor_record.remove_out(vertex, Some(incidence.edge_id));
                    self.store(collection, incidence.neighbor, neighbor_record);
                }
            }
            self.engine.write_batch(&[(collection, vertex, WriteValue::Tombstone)]);
            results.push((vertex, removed));
        }
        Ok(results)
    }

    /// Return each vertex's degree and incident edge triplets, filtered to
    /// `roles` (`SPEC_FULL.md` §4.4 "find_edges").
    pub fn find_edges(&self, collection: CollectionId, vertices: &[Key], roles: Role) -> Vec<VertexEdges> {
        vertices
            .iter()
            .map(|&vertex| {
                let exists = matches!(self.engine.read_one(collection, vertex, None), Some(v) if !v.is_tombstone());
                if !exists {
                    return VertexEdges { vertex, degree: VERTEX_DEGREE_MISSING, edges: Vec::new() };
                }
                let record = self.load(collection, vertex);
                let mut out_edges: Vec<Edge> =
                    record.out.iter().map(|i| Edge { source: vertex, target: i.neighbor, edge_id: i.edge_id }).collect();
                out_edges.sort_by_key(|e| (e.target, e.edge_id));
                let mut in_edges: Vec<Edge> =
                    record.in_.iter().map(|i| Edge { source: i.neighbor, target: vertex, edge_id: i.edge_id }).collect();
                in_edges.sort_by_key(|e| (e.source, e.edge_id));
                let edges = match roles {
                    Role::Source => out_edges,
                    Role::Target => in_edges,
                    Role::Any => {
                        let mut all = out_edges;
                        all.extend(in_edges);
                        all
                    }
                };
                VertexEdges { vertex, degree: record.degree() as u32, edges }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ukv_core::MAIN_COLLECTION;

    #[test]
    fn directed_upsert_mirrors_out_and_in() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0)]).unwrap();
        let found = store.find_edges(MAIN_COLLECTION, &[1, 2], Role::Any);
        assert_eq!(found[0].edges, vec![Edge { source: 1, target: 2, edge_id: 0 }]);
        assert_eq!(found[1].edges, vec![Edge { source: 1, target: 2, edge_id: 0 }]);
    }

    #[test]
    fn undirected_upsert_mirrors_on_both_endpoints_out_segment() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, false);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0)]).unwrap();
        let found = store.find_edges(MAIN_COLLECTION, &[1, 2], Role::Source);
        assert_eq!(found[0].edges[0], Edge { source: 1, target: 2, edge_id: 0 });
        assert_eq!(found[1].edges[0], Edge { source: 2, target: 1, edge_id: 0 });
    }

    #[test]
    fn duplicate_triplet_insert_is_a_no_op() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0), (1, 2, 0)]).unwrap();
        let found = store.find_edges(MAIN_COLLECTION, &[1], Role::Source);
        assert_eq!(found[0].edges.len(), 1);
    }

    #[test]
    fn remove_edges_with_no_id_removes_every_parallel_edge() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0), (1, 2, 1)]).unwrap();
        store.remove_edges(MAIN_COLLECTION, &[(1, 2, None)]).unwrap();
        let found = store.find_edges(MAIN_COLLECTION, &[1, 2], Role::Any);
        assert!(found[0].edges.is_empty());
        assert!(found[1].edges.is_empty());
    }

    #[test]
    fn remove_vertices_cascades_to_neighbors() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0), (3, 1, 0)]).unwrap();
        let removed = store.remove_vertices(MAIN_COLLECTION, &[1], Role::Any).unwrap();
        assert_eq!(removed[0].1.len(), 2);
        let found = store.find_edges(MAIN_COLLECTION, &[2, 3], Role::Any);
        assert!(found[0].edges.is_empty());
        assert!(found[1].edges.is_empty());
    }

    #[test]
    fn missing_vertex_yields_sentinel_degree() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        let found = store.find_edges(MAIN_COLLECTION, &[99], Role::Any);
        assert_eq!(found[0].degree, VERTEX_DEGREE_MISSING);
    }

    #[test]
    fn removed_vertex_yields_sentinel_degree_not_zero() {
        let engine = Engine::new();
        let store = GraphStore::new(&engine, true);
        store.upsert_edges(MAIN_COLLECTION, &[(1, 2, 0)]).unwrap();
        store.remove_vertices(MAIN_COLLECTION, &[1], Role::Any).unwrap();
        let found = store.find_edges(MAIN_COLLECTION, &[1], Role::Any);
        assert_eq!(found[0].degree, VERTEX_DEGREE_MISSING);
        assert!(found[0].edges.is_empty());
    }
}
