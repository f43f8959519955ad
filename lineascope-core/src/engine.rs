//! The rendering engine's element store: holds the current node/edge set,
//! computes placement, and serves snapshots and raster renders. Loads fully
//! replace the element set through the [`GraphSink`] swap contract.

use crate::encode::{Color, Shape, StyleRuleset, base_style};
use image::{Rgba, RgbaImage};
use lineascope_client::{GraphEdge, GraphNode, GraphSink};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

const COLUMN_SPACING: f64 = 220.0;
const ROW_SPACING: f64 = 90.0;

// Base (1x) glyph size used by the rasterizer.
const NODE_WIDTH: f64 = 56.0;
const NODE_HEIGHT: f64 = 28.0;

/// Node placement in abstract layout units. Depth from a root maps to x,
/// the row within that depth to y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Serialized full graph state, as written by the JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub metadata: SnapshotMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub positions: BTreeMap<String, Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub generator: String,
    pub version: String,
    pub generated_at: String,
}

/// Options for rendering the current graph to an image buffer.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub scale: u32,
    pub background: Color,
    pub padding: f64,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            background: Color::rgb(0x0b, 0x12, 0x20),
            padding: 40.0,
        }
    }
}

/// Full rendering-engine contract consumed by exports and viewers.
pub trait GraphEngine: GraphSink {
    fn apply_style(&mut self, style: StyleRuleset);
    fn style(&self) -> &StyleRuleset;
    fn nodes(&self) -> &[GraphNode];
    fn edges(&self) -> &[GraphEdge];
    fn position_of(&self, id: &str) -> Option<Position>;
    fn snapshot(&self) -> GraphSnapshot;
    fn render_image(&self, options: &ImageOptions) -> RgbaImage;
}

/// The concrete engine. Elements are stored as given; a petgraph index is
/// rebuilt on mutation to drive the depth-layered placement. Edges naming a
/// missing endpoint stay in the element set but get no say in placement.
pub struct LineageGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    style: StyleRuleset,
    positions: BTreeMap<String, Position>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            style: base_style(),
            positions: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Recompute placement: BFS depth layering from the roots (nodes with
    /// no incoming edge), columns by depth, rows centered within a column.
    /// Nodes only reachable through a cycle seed fresh roots at depth 0.
    fn rebuild_layout(&mut self) {
        self.positions.clear();
        if self.nodes.is_empty() {
            return;
        }

        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut index_by_id: HashMap<&str, NodeIndex> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let index = graph.add_node(i);
            index_by_id.insert(node.id.as_str(), index);
        }
        for edge in &self.edges {
            if let (Some(&source), Some(&target)) = (
                index_by_id.get(edge.source.as_str()),
                index_by_id.get(edge.target.as_str()),
            ) {
                graph.add_edge(source, target, ());
            }
        }

        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for index in graph.node_indices() {
            if graph
                .neighbors_directed(index, Direction::Incoming)
                .next()
                .is_none()
            {
                depth.insert(index, 0);
                queue.push_back(index);
            }
        }

        loop {
            while let Some(index) = queue.pop_front() {
                let d = depth[&index];
                for next in graph.neighbors_directed(index, Direction::Outgoing) {
                    if !depth.contains_key(&next) {
                        depth.insert(next, d + 1);
                        queue.push_back(next);
                    }
                }
            }
            match graph.node_indices().find(|index| !depth.contains_key(index)) {
                Some(index) => {
                    depth.insert(index, 0);
                    queue.push_back(index);
                }
                None => break,
            }
        }

        let mut columns: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for index in graph.node_indices() {
            columns.entry(depth[&index]).or_default().push(index);
        }
        for (column_depth, column) in &columns {
            let offset = (column.len() as f64 - 1.0) / 2.0;
            for (row, &index) in column.iter().enumerate() {
                let node = &self.nodes[graph[index]];
                self.positions.insert(
                    node.id.clone(),
                    Position {
                        x: *column_depth as f64 * COLUMN_SPACING,
                        y: (row as f64 - offset) * ROW_SPACING,
                    },
                );
            }
        }
    }

    /// Bounding box over all node positions, or None for an empty graph.
    pub fn bounds(&self) -> Option<(Position, Position)> {
        let mut positions = self.positions.values();
        let first = *positions.next()?;
        let mut min = first;
        let mut max = first;
        for position in positions {
            min.x = min.x.min(position.x);
            min.y = min.y.min(position.y);
            max.x = max.x.max(position.x);
            max.y = max.y.max(position.y);
        }
        Some((min, max))
    }
}

impl Default for LineageGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSink for LineageGraph {
    fn clear_elements(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.positions.clear();
    }

    fn add_nodes(&mut self, nodes: Vec<GraphNode>) {
        self.nodes.extend(nodes);
        self.rebuild_layout();
    }

    fn add_edges(&mut self, edges: Vec<GraphEdge>) {
        self.edges.extend(edges);
        self.rebuild_layout();
    }
}

impl GraphEngine for LineageGraph {
    fn apply_style(&mut self, style: StyleRuleset) {
        self.style = style;
    }

    fn style(&self) -> &StyleRuleset {
        &self.style
    }

    fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    fn position_of(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            metadata: SnapshotMetadata {
                generator: "Lineascope".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            positions: self.positions.clone(),
        }
    }

    fn render_image(&self, options: &ImageOptions) -> RgbaImage {
        let scale = options.scale.max(1);
        let (min, max) = self.bounds().unwrap_or((
            Position { x: 0.0, y: 0.0 },
            Position { x: 0.0, y: 0.0 },
        ));

        let content_width = (max.x - min.x) + NODE_WIDTH + 2.0 * options.padding;
        let content_height = (max.y - min.y) + NODE_HEIGHT + 2.0 * options.padding;
        let width = (content_width * scale as f64).ceil() as u32;
        let height = (content_height * scale as f64).ceil() as u32;

        let background = to_pixel(options.background);
        let mut img = RgbaImage::from_pixel(width.max(1), height.max(1), background);

        // Layout units -> pixel center of a node glyph.
        let origin_x = (options.padding + NODE_WIDTH / 2.0) * scale as f64;
        let origin_y = (options.padding + NODE_HEIGHT / 2.0) * scale as f64;
        let center = |position: Position| -> (f64, f64) {
            (
                origin_x + (position.x - min.x) * scale as f64,
                origin_y + (position.y - min.y) * scale as f64,
            )
        };

        for edge in &self.edges {
            if let (Some(source), Some(target)) = (
                self.position_of(&edge.source),
                self.position_of(&edge.target),
            ) {
                let (x0, y0) = center(source);
                let (x1, y1) = center(target);
                let color = to_pixel((self.style.edge.line_color)(edge));
                draw_line(
                    &mut img,
                    x0,
                    y0,
                    x1,
                    y1,
                    u32::from(self.style.edge.width) * scale / 2,
                    color,
                );
            }
        }

        let half_w = NODE_WIDTH / 2.0 * scale as f64;
        let half_h = NODE_HEIGHT / 2.0 * scale as f64;
        let border_inset = f64::from(self.style.node.border_width) * scale as f64;
        for node in &self.nodes {
            if let Some(position) = self.position_of(&node.id) {
                let (cx, cy) = center(position);
                let shape = (self.style.node.shape)(node);
                let border = to_pixel(self.style.node.border_color);
                let fill = to_pixel((self.style.node.background_color)(node));
                fill_glyph(&mut img, cx, cy, half_w, half_h, shape, border);
                fill_glyph(
                    &mut img,
                    cx,
                    cy,
                    half_w - border_inset,
                    half_h - border_inset,
                    shape,
                    fill,
                );
            }
        }

        img
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 0xff])
}

fn put_pixel_checked(img: &mut RgbaImage, x: i64, y: i64, pixel: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, pixel);
    }
}

/// Bresenham segment with a square pen of the given radius.
fn draw_line(img: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64, radius: u32, pixel: Rgba<u8>) {
    let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
    let (end_x, end_y) = (x1.round() as i64, y1.round() as i64);
    let dx = (end_x - x).abs();
    let dy = -(end_y - y).abs();
    let step_x = if x < end_x { 1 } else { -1 };
    let step_y = if y < end_y { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = radius as i64;

    loop {
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                put_pixel_checked(img, x + ox, y + oy, pixel);
            }
        }
        if x == end_x && y == end_y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
}

/// Fill a node glyph by testing each pixel of the bounding box against the
/// shape's inclusion predicate.
fn fill_glyph(
    img: &mut RgbaImage,
    cx: f64,
    cy: f64,
    half_w: f64,
    half_h: f64,
    shape: Shape,
    pixel: Rgba<u8>,
) {
    if half_w <= 0.0 || half_h <= 0.0 {
        return;
    }
    let x_lo = (cx - half_w).floor() as i64;
    let x_hi = (cx + half_w).ceil() as i64;
    let y_lo = (cy - half_h).floor() as i64;
    let y_hi = (cy + half_h).ceil() as i64;

    for x in x_lo..=x_hi {
        for y in y_lo..=y_hi {
            let nx = (x as f64 - cx) / half_w;
            let ny = (y as f64 - cy) / half_h;
            if nx.abs() > 1.0 || ny.abs() > 1.0 {
                continue;
            }
            let inside = match shape {
                Shape::Rectangle | Shape::RoundRectangle => true,
                Shape::Ellipse => nx * nx + ny * ny <= 1.0,
                Shape::Diamond => nx.abs() + ny.abs() <= 1.0,
                Shape::Hexagon => nx.abs() + 0.5 * ny.abs() <= 1.0,
                Shape::Octagon => nx.abs() + ny.abs() <= 1.5,
            };
            if inside {
                put_pixel_checked(img, x, y, pixel);
            }
        }
    }
}
