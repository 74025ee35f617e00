//! Graphs: vertices joined by undirected edges.

use std::any::Any;
use std::collections::HashMap;

use glam::Vec3;

use crate::error::{Easy3dError, Result};
use crate::model::Model;
use crate::property::PropertyContainer;

/// An undirected graph embedded in 3D. Self loops and parallel edges are rejected.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    vprops: PropertyContainer,
    eprops: PropertyContainer,
    edges: Vec<[usize; 2]>,
    edge_lookup: HashMap<(usize, usize), usize>,
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        let mut vprops = PropertyContainer::new();
        let _ = vprops.add("v:point", Vec3::ZERO);
        Self {
            name: name.into(),
            vprops,
            eprops: PropertyContainer::new(),
            edges: Vec::new(),
            edge_lookup: HashMap::new(),
            adjacency: Vec::new(),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        let index = self.vprops.len();
        self.vprops.push();
        if let Some(points) = self.vprops.get_mut::<Vec3>("v:point") {
            points[index] = p;
        }
        self.adjacency.push(Vec::new());
        index
    }

    /// Joins two existing, distinct, not yet connected vertices.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<usize> {
        let n = self.n_vertices();
        let key = (a.min(b), a.max(b));
        if a == b || a >= n || b >= n || self.edge_lookup.contains_key(&key) {
            return Err(Easy3dError::InvalidEdge(a, b));
        }
        let e = self.edges.len();
        self.edges.push([a, b]);
        self.edge_lookup.insert(key, e);
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.eprops.push();
        Ok(e)
    }

    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    #[must_use]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    #[must_use]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }

    #[must_use]
    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    #[must_use]
    pub fn edge_length(&self, e: usize) -> f32 {
        let [a, b] = self.edges[e];
        let points = self.points();
        points[a].distance(points[b])
    }

    pub fn points_mut(&mut self) -> &mut [Vec3] {
        self.vprops.get_mut::<Vec3>("v:point").unwrap_or_default()
    }

    pub fn vertex_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.vprops
    }

    #[must_use]
    pub fn edge_properties(&self) -> &PropertyContainer {
        &self.eprops
    }

    pub fn edge_properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.eprops
    }
}

impl Model for Graph {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn type_name(&self) -> &'static str {
        "Graph"
    }

    fn points(&self) -> &[Vec3] {
        self.vprops.get::<Vec3>("v:point").unwrap_or_default()
    }

    fn vertex_properties(&self) -> &PropertyContainer {
        &self.vprops
    }

    fn property_stats(&self) -> Vec<String> {
        let mut lines = vec![format!("vertex properties ({})", self.n_vertices())];
        lines.extend(self.vprops.describe().into_iter().map(|l| format!("    {l}")));
        lines.push(format!("edge properties ({})", self.n_edges()));
        lines.extend(self.eprops.describe().into_iter().map(|l| format!("    {l}")));
        lines
    }
}
