//! Visual encoding: the fixed mapping from entity and relation tags to
//! colors, shapes and label text. Every function here is pure and total;
//! unrecognized inputs degrade to a defined fallback, never to an error.

use lineascope_client::{EntityType, GraphEdge, GraphNode, OperationKind, RelationKind};

/// An RGB color from the viewer palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Node glyph outline. Website/Directory share the rounded-box family;
/// the remaining known types each get their own outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    RoundRectangle,
    Rectangle,
    Diamond,
    Ellipse,
    Hexagon,
    Octagon,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::RoundRectangle => "round-rectangle",
            Shape::Rectangle => "rectangle",
            Shape::Diamond => "diamond",
            Shape::Ellipse => "ellipse",
            Shape::Hexagon => "hexagon",
            Shape::Octagon => "octagon",
        }
    }

    /// Boxy shapes rasterize and draw as rectangles; the rest as rounded
    /// outlines.
    pub fn is_boxy(&self) -> bool {
        matches!(self, Shape::RoundRectangle | Shape::Rectangle)
    }
}

pub fn color_for_type(entity_type: EntityType) -> Color {
    match entity_type {
        EntityType::Website => Color::rgb(0x25, 0x63, 0xeb),
        EntityType::Server => Color::rgb(0x4f, 0x46, 0xe5),
        EntityType::Software => Color::rgb(0x7c, 0x3a, 0xed),
        EntityType::Directory => Color::rgb(0x0e, 0xa5, 0xe9),
        EntityType::Feed => Color::rgb(0x10, 0xb9, 0x81),
        EntityType::Pde => Color::rgb(0xf5, 0x9e, 0x0b),
        EntityType::FlowRun => Color::rgb(0xef, 0x44, 0x44),
        EntityType::Unknown => Color::rgb(0x64, 0x74, 0x8b),
    }
}

pub fn shape_for_type(entity_type: EntityType) -> Shape {
    match entity_type {
        EntityType::Website => Shape::RoundRectangle,
        EntityType::Server => Shape::Rectangle,
        EntityType::Software => Shape::Diamond,
        EntityType::Directory => Shape::RoundRectangle,
        EntityType::Feed => Shape::Ellipse,
        EntityType::Pde => Shape::Hexagon,
        EntityType::FlowRun => Shape::Octagon,
        EntityType::Unknown => Shape::Ellipse,
    }
}

/// Two-line node label: the type name, then the first populated name-like
/// field. The second line is empty when the node carries none of them.
pub fn label_for(node: &GraphNode) -> String {
    match node.display_name() {
        Some(name) => format!("{}\n{}", node.entity_type.as_str(), name),
        None => format!("{}\n", node.entity_type.as_str()),
    }
}

/// Edge color dispatch: relation first, then operation. Flow edges split by
/// op with a rose default when the op is absent or unrecognized; structural
/// relations share one slate color regardless of op; anything else gets the
/// neutral fallback.
pub fn edge_color(label: Option<RelationKind>, op: Option<OperationKind>) -> Color {
    match label {
        Some(RelationKind::Flow) => match op {
            Some(OperationKind::Mask) => Color::rgb(0xf5, 0x9e, 0x0b),
            Some(OperationKind::Transform) => Color::rgb(0x22, 0xd3, 0xee),
            Some(OperationKind::SurrogateJoin) => Color::rgb(0xea, 0xb3, 0x08),
            _ => Color::rgb(0xfb, 0x71, 0x85),
        },
        Some(RelationKind::Reads) => Color::rgb(0x60, 0xa5, 0xfa),
        Some(RelationKind::Writes) => Color::rgb(0x34, 0xd3, 0x99),
        Some(kind) if kind.is_structural() => Color::rgb(0x94, 0xa3, 0xb8),
        _ => Color::rgb(0xa3, 0xa3, 0xa3),
    }
}

/// `"{label}:{op}"` when the edge carries an op, else the bare relation,
/// else an empty label.
pub fn edge_label(edge: &GraphEdge) -> String {
    match (edge.label, edge.op) {
        (Some(label), Some(op)) => format!("{}:{}", label.as_str(), op.as_str()),
        (Some(label), None) => label.as_str().to_string(),
        (None, _) => String::new(),
    }
}

/// Node styling rule. Data-dependent attributes are function pointers
/// evaluated per element at draw time, so a changed entity field shows up
/// on the next draw without rebuilding the ruleset.
#[derive(Debug, Clone, Copy)]
pub struct NodeRule {
    pub background_color: fn(&GraphNode) -> Color,
    pub shape: fn(&GraphNode) -> Shape,
    pub label: fn(&GraphNode) -> String,
    pub text_color: Color,
    pub border_width: u16,
    pub border_color: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeRule {
    pub line_color: fn(&GraphEdge) -> Color,
    pub arrow_color: fn(&GraphEdge) -> Color,
    pub label: fn(&GraphEdge) -> String,
    pub width: u16,
    pub text_color: Color,
}

/// Fixed border emphasis applied to the selected element.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRule {
    pub border_width: u16,
    pub border_color: Color,
}

/// The full style ruleset a rendering engine draws with. Built once and
/// reused across loads; nothing in it binds to a particular element set.
#[derive(Debug, Clone, Copy)]
pub struct StyleRuleset {
    pub node: NodeRule,
    pub edge: EdgeRule,
    pub selected: SelectionRule,
}

pub fn base_style() -> StyleRuleset {
    StyleRuleset {
        node: NodeRule {
            background_color: |node| color_for_type(node.entity_type),
            shape: |node| shape_for_type(node.entity_type),
            label: label_for,
            text_color: Color::rgb(0xe5, 0xe7, 0xeb),
            border_width: 1,
            border_color: Color::rgb(0x0e, 0xa5, 0xe9),
        },
        edge: EdgeRule {
            line_color: |edge| edge_color(edge.label, edge.op),
            arrow_color: |edge| edge_color(edge.label, edge.op),
            label: edge_label,
            width: 2,
            text_color: Color::rgb(0xa3, 0xa3, 0xa3),
        },
        selected: SelectionRule {
            border_width: 3,
            border_color: Color::rgb(0xf5, 0x9e, 0x0b),
        },
    }
}
