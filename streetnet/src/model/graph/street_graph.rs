use super::{Crs, Direction as Dir, EdgeData, NodeData, NodeId};
use crate::model::error::NetworkError;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

pub type Nodes = HashMap<NodeId, NodeData>;
pub type EdgesByOd = HashMap<(NodeId, NodeId), Vec<EdgeData>>;
pub type AdjacencyList = HashMap<(NodeId, Dir), HashSet<NodeId>>;

/// directed multigraph of road junctions and segments.
///
/// nodes are stored by id; edges are stored per ordered (src, dst) pair as a
/// multiedge collection, each entry carrying the insertion key that
/// distinguishes parallels. a forward and reverse adjacency list is kept in
/// sync with the edge store.
///
/// the graph exclusively owns its attribute stores. iteration over nodes and
/// edges is sorted so repeated runs over the same graph version yield the
/// same order.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    crs: Crs,
    simplified: bool,
    created_date: String,
    created_with: String,
    nodes: Nodes,
    edges: EdgesByOd,
    adj: AdjacencyList,
}

impl StreetGraph {
    pub fn new(crs: Crs, created_with: &str) -> StreetGraph {
        StreetGraph {
            crs,
            simplified: false,
            created_date: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            created_with: String::from(created_with),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            adj: HashMap::new(),
        }
    }

    /// reconstructs a graph shell with explicit metadata, used when loading
    /// from an exchange format.
    pub fn with_metadata(
        crs: Crs,
        simplified: bool,
        created_date: &str,
        created_with: &str,
    ) -> StreetGraph {
        StreetGraph {
            crs,
            simplified,
            created_date: String::from(created_date),
            created_with: String::from(created_with),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            adj: HashMap::new(),
        }
    }

    /// an empty graph carrying this graph's metadata, used by operations
    /// that rebuild rather than mutate.
    pub fn like(&self) -> StreetGraph {
        StreetGraph {
            crs: self.crs.clone(),
            simplified: self.simplified,
            created_date: self.created_date.clone(),
            created_with: self.created_with.clone(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            adj: HashMap::new(),
        }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    /// flips the simplified flag exactly once.
    pub fn mark_simplified(&mut self) -> Result<(), NetworkError> {
        if self.simplified {
            return Err(NetworkError::AlreadySimplified);
        }
        self.simplified = true;
        Ok(())
    }

    pub fn created_date(&self) -> &str {
        &self.created_date
    }

    pub fn created_with(&self) -> &str {
        &self.created_with
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.values().map(|multiedges| multiedges.len()).sum()
    }

    pub fn has_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn node(&self, node_id: &NodeId) -> Result<&NodeData, NetworkError> {
        self.nodes
            .get(node_id)
            .ok_or(NetworkError::MissingNode(*node_id))
    }

    pub fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut NodeData, NetworkError> {
        self.nodes
            .get_mut(node_id)
            .ok_or(NetworkError::MissingNode(*node_id))
    }

    pub fn add_node(&mut self, node: NodeData) -> Result<(), NetworkError> {
        let node_id = node.osmid;
        if self.nodes.insert(node_id, node).is_some() {
            return Err(NetworkError::InvalidInput(format!(
                "attempting to insert node {node_id} already present in graph"
            )));
        }
        Ok(())
    }

    /// node ids sorted for deterministic iteration.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().sorted().collect_vec()
    }

    /// sorted (id, data) pairs.
    pub fn nodes_iter(&self) -> impl Iterator<Item = (&NodeId, &NodeData)> {
        self.nodes.iter().sorted_by_key(|(id, _)| **id)
    }

    /// removes a node along with every incident edge.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<NodeData, NetworkError> {
        let out_neighbors = self.out_neighbors(node_id);
        let in_neighbors = self.in_neighbors(node_id);
        for dst in out_neighbors.iter() {
            self.remove_edges_between(node_id, dst)?;
        }
        for src in in_neighbors.iter() {
            if src != node_id {
                self.remove_edges_between(src, node_id)?;
            }
        }
        self.adj.remove(&(*node_id, Dir::Forward));
        self.adj.remove(&(*node_id, Dir::Reverse));
        self.nodes
            .remove(node_id)
            .ok_or(NetworkError::MissingNode(*node_id))
    }

    /// appends a directed edge and returns the fresh key distinguishing it
    /// from any parallel siblings. both endpoints must already exist.
    pub fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        mut edge: EdgeData,
    ) -> Result<usize, NetworkError> {
        if !self.has_node(&src) {
            return Err(NetworkError::MissingNode(src));
        }
        if !self.has_node(&dst) {
            return Err(NetworkError::MissingNode(dst));
        }
        let multiedges = self.edges.entry((src, dst)).or_default();
        let key = multiedges.iter().map(|e| e.key + 1).max().unwrap_or(0);
        edge.key = key;
        multiedges.push(edge);
        self.adj
            .entry((src, Dir::Forward))
            .or_default()
            .insert(dst);
        self.adj
            .entry((dst, Dir::Reverse))
            .or_default()
            .insert(src);
        Ok(key)
    }

    /// removes one parallel edge by key. sibling keys are unaffected.
    pub fn remove_edge(
        &mut self,
        src: &NodeId,
        dst: &NodeId,
        key: usize,
    ) -> Result<EdgeData, NetworkError> {
        let multiedges = self
            .edges
            .get_mut(&(*src, *dst))
            .ok_or(NetworkError::MissingEdge(*src, *dst, key))?;
        let position = multiedges
            .iter()
            .position(|e| e.key == key)
            .ok_or(NetworkError::MissingEdge(*src, *dst, key))?;
        let removed = multiedges.remove(position);
        if multiedges.is_empty() {
            self.edges.remove(&(*src, *dst));
            self.clear_adjacency(src, dst);
        }
        Ok(removed)
    }

    /// removes the whole multiedge collection between an ordered pair.
    pub fn remove_edges_between(
        &mut self,
        src: &NodeId,
        dst: &NodeId,
    ) -> Result<Vec<EdgeData>, NetworkError> {
        let removed = self
            .edges
            .remove(&(*src, *dst))
            .ok_or(NetworkError::MissingEdge(*src, *dst, 0))?;
        self.clear_adjacency(src, dst);
        Ok(removed)
    }

    fn clear_adjacency(&mut self, src: &NodeId, dst: &NodeId) {
        if let Some(neighbors) = self.adj.get_mut(&(*src, Dir::Forward)) {
            neighbors.remove(dst);
            if neighbors.is_empty() {
                self.adj.remove(&(*src, Dir::Forward));
            }
        }
        if let Some(neighbors) = self.adj.get_mut(&(*dst, Dir::Reverse)) {
            neighbors.remove(src);
            if neighbors.is_empty() {
                self.adj.remove(&(*dst, Dir::Reverse));
            }
        }
    }

    /// the multiedge collection between an ordered pair, sorted by key.
    /// empty when no edge connects the pair.
    pub fn edges_between(&self, src: &NodeId, dst: &NodeId) -> Vec<&EdgeData> {
        match self.edges.get(&(*src, *dst)) {
            Some(multiedges) => multiedges.iter().sorted_by_key(|e| e.key).collect_vec(),
            None => vec![],
        }
    }

    pub fn edge(&self, src: &NodeId, dst: &NodeId, key: usize) -> Result<&EdgeData, NetworkError> {
        self.edges
            .get(&(*src, *dst))
            .and_then(|multiedges| multiedges.iter().find(|e| e.key == key))
            .ok_or(NetworkError::MissingEdge(*src, *dst, key))
    }

    pub fn edge_mut(
        &mut self,
        src: &NodeId,
        dst: &NodeId,
        key: usize,
    ) -> Result<&mut EdgeData, NetworkError> {
        self.edges
            .get_mut(&(*src, *dst))
            .and_then(|multiedges| multiedges.iter_mut().find(|e| e.key == key))
            .ok_or(NetworkError::MissingEdge(*src, *dst, key))
    }

    fn neighbors(&self, node_id: &NodeId, dir: Dir) -> Vec<NodeId> {
        match self.adj.get(&(*node_id, dir)) {
            Some(neighbors) => neighbors.iter().copied().sorted().collect_vec(),
            None => vec![],
        }
    }

    /// successors, sorted for deterministic iteration.
    pub fn out_neighbors(&self, node_id: &NodeId) -> Vec<NodeId> {
        self.neighbors(node_id, Dir::Forward)
    }

    /// predecessors, sorted for deterministic iteration.
    pub fn in_neighbors(&self, node_id: &NodeId) -> Vec<NodeId> {
        self.neighbors(node_id, Dir::Reverse)
    }

    /// unique neighbors in either direction, sorted.
    pub fn neighbor_set(&self, node_id: &NodeId) -> Vec<NodeId> {
        let fwd = self.adj.get(&(*node_id, Dir::Forward));
        let rev = self.adj.get(&(*node_id, Dir::Reverse));
        match (fwd, rev) {
            (None, None) => vec![],
            (Some(f), None) => f.iter().copied().sorted().collect_vec(),
            (None, Some(r)) => r.iter().copied().sorted().collect_vec(),
            (Some(f), Some(r)) => f.union(r).copied().sorted().collect_vec(),
        }
    }

    /// number of outgoing edges, counting parallels.
    pub fn out_degree(&self, node_id: &NodeId) -> usize {
        self.out_neighbors(node_id)
            .iter()
            .map(|dst| self.edges_between(node_id, dst).len())
            .sum()
    }

    /// number of incoming edges, counting parallels.
    pub fn in_degree(&self, node_id: &NodeId) -> usize {
        self.in_neighbors(node_id)
            .iter()
            .map(|src| self.edges_between(src, node_id).len())
            .sum()
    }

    /// total degree counting parallels; a self-loop contributes twice.
    pub fn degree(&self, node_id: &NodeId) -> usize {
        self.in_degree(node_id) + self.out_degree(node_id)
    }

    pub fn has_self_loop(&self, node_id: &NodeId) -> bool {
        self.edges.contains_key(&(*node_id, *node_id))
    }

    /// all (src, dst, key) triples, sorted for deterministic iteration.
    pub fn edge_triples(&self) -> Vec<(NodeId, NodeId, usize)> {
        self.edges
            .iter()
            .flat_map(|((src, dst), multiedges)| {
                let (src, dst) = (*src, *dst);
                multiedges.iter().map(move |e| (src, dst, e.key))
            })
            .sorted()
            .collect_vec()
    }

    /// sorted iteration over every edge with its endpoints.
    pub fn edges_iter(&self) -> impl Iterator<Item = (NodeId, NodeId, &EdgeData)> {
        self.edges
            .iter()
            .sorted_by_key(|((src, dst), _)| (*src, *dst))
            .flat_map(|((src, dst), multiedges)| {
                let (src, dst) = (*src, *dst);
                multiedges
                    .iter()
                    .sorted_by_key(|e| e.key)
                    .map(move |e| (src, dst, e))
            })
    }

    /// inserts an edge keeping the key it already carries. used when
    /// copying a graph subset where parallel-edge identity must survive.
    pub(crate) fn add_edge_keyed(
        &mut self,
        src: NodeId,
        dst: NodeId,
        edge: EdgeData,
    ) -> Result<(), NetworkError> {
        if !self.has_node(&src) {
            return Err(NetworkError::MissingNode(src));
        }
        if !self.has_node(&dst) {
            return Err(NetworkError::MissingNode(dst));
        }
        let multiedges = self.edges.entry((src, dst)).or_default();
        if multiedges.iter().any(|e| e.key == edge.key) {
            return Err(NetworkError::InternalError(format!(
                "edge ({src})-[{}]->({dst}) already present in graph",
                edge.key
            )));
        }
        multiedges.push(edge);
        self.adj
            .entry((src, Dir::Forward))
            .or_default()
            .insert(dst);
        self.adj
            .entry((dst, Dir::Reverse))
            .or_default()
            .insert(src);
        Ok(())
    }

    /// the subgraph induced by a node set: those nodes plus every edge whose
    /// endpoints both survive, keeping their keys.
    pub fn subgraph(&self, keep: &HashSet<NodeId>) -> Result<StreetGraph, NetworkError> {
        let mut out = self.like();
        for node_id in keep.iter().sorted() {
            out.add_node(self.node(node_id)?.clone())?;
        }
        for (src, dst, edge) in self.edges_iter() {
            if keep.contains(&src) && keep.contains(&dst) {
                out.add_edge_keyed(src, dst, edge.clone())?;
            }
        }
        Ok(out)
    }
}
