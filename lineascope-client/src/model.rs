use serde::{Deserialize, Serialize};

/// Asset class of a lineage node. Unrecognized or missing type tags fall
/// back to `Unknown` rather than failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Website,
    Server,
    Software,
    Directory,
    Feed,
    Pde,
    FlowRun,
    #[default]
    Unknown,
}

impl EntityType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Website" => EntityType::Website,
            "Server" => EntityType::Server,
            "Software" => EntityType::Software,
            "Directory" => EntityType::Directory,
            "Feed" => EntityType::Feed,
            "PDE" => EntityType::Pde,
            "FlowRun" => EntityType::FlowRun,
            _ => EntityType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Website => "Website",
            EntityType::Server => "Server",
            EntityType::Software => "Software",
            EntityType::Directory => "Directory",
            EntityType::Feed => "Feed",
            EntityType::Pde => "PDE",
            EntityType::FlowRun => "FlowRun",
            EntityType::Unknown => "Unknown",
        }
    }
}

impl From<String> for EntityType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.as_str().to_string()
    }
}

/// Relationship carried by an edge. `Flow` edges move data and may carry an
/// [`OperationKind`]; the rest are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationKind {
    Flow,
    Reads,
    Writes,
    HostedOn,
    Runs,
    Uses,
    Exposes,
    Has,
    Other,
}

impl RelationKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "flow" => RelationKind::Flow,
            "reads" => RelationKind::Reads,
            "writes" => RelationKind::Writes,
            "hosted_on" => RelationKind::HostedOn,
            "runs" => RelationKind::Runs,
            "uses" => RelationKind::Uses,
            "exposes" => RelationKind::Exposes,
            "has" => RelationKind::Has,
            _ => RelationKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Flow => "flow",
            RelationKind::Reads => "reads",
            RelationKind::Writes => "writes",
            RelationKind::HostedOn => "hosted_on",
            RelationKind::Runs => "runs",
            RelationKind::Uses => "uses",
            RelationKind::Exposes => "exposes",
            RelationKind::Has => "has",
            RelationKind::Other => "other",
        }
    }

    /// Structural relations share one visual treatment regardless of op.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RelationKind::HostedOn
                | RelationKind::Runs
                | RelationKind::Uses
                | RelationKind::Exposes
                | RelationKind::Has
        )
    }
}

impl From<String> for RelationKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<RelationKind> for String {
    fn from(kind: RelationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Sub-classification of a flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    Mask,
    Transform,
    SurrogateJoin,
    Other,
}

impl OperationKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "mask" => OperationKind::Mask,
            "transform" => OperationKind::Transform,
            "surrogate_join" => OperationKind::SurrogateJoin,
            _ => OperationKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Mask => "mask",
            OperationKind::Transform => "transform",
            OperationKind::SurrogateJoin => "surrogate_join",
            OperationKind::Other => "other",
        }
    }
}

impl From<String> for OperationKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<OperationKind> for String {
    fn from(op: OperationKind) -> Self {
        op.as_str().to_string()
    }
}

/// A single asset in the lineage graph. Exactly one of the name-like fields
/// is expected to be populated per type, but nothing enforces that; label
/// composition just takes the first one present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pde_key: Option<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: id.into(),
            entity_type,
            name: None,
            url: None,
            fqdn: None,
            path: None,
            site_key: None,
            server_key: None,
            soft_key: None,
            dir_key: None,
            feed_key: None,
            pde_key: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// First populated name-like field, in the fixed priority order used for
    /// node labels. `None` when the node carries no recognized name field.
    pub fn display_name(&self) -> Option<&str> {
        [
            &self.name,
            &self.url,
            &self.fqdn,
            &self.path,
            &self.site_key,
            &self.server_key,
            &self.soft_key,
            &self.dir_key,
            &self.feed_key,
            &self.pde_key,
        ]
        .into_iter()
        .find_map(|field| field.as_deref().filter(|value| !value.is_empty()))
    }
}

/// A data-flow or structural relationship between two nodes, referencing
/// them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<RelationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<OperationKind>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            op: None,
        }
    }

    pub fn with_label(mut self, label: RelationKind) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_op(mut self, op: OperationKind) -> Self {
        self.op = Some(op);
        self
    }
}

/// The lineage API response body. Both fields are required; a body missing
/// either is a malformed response, not an empty graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trips_known_tags() {
        for (tag, expected) in [
            ("\"Website\"", EntityType::Website),
            ("\"Server\"", EntityType::Server),
            ("\"Software\"", EntityType::Software),
            ("\"Directory\"", EntityType::Directory),
            ("\"Feed\"", EntityType::Feed),
            ("\"PDE\"", EntityType::Pde),
            ("\"FlowRun\"", EntityType::FlowRun),
        ] {
            let parsed: EntityType = serde_json::from_str(tag).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(serde_json::to_string(&parsed).unwrap(), tag);
        }
    }

    #[test]
    fn unrecognized_entity_type_falls_back_to_unknown() {
        let parsed: EntityType = serde_json::from_str("\"Mainframe\"").unwrap();
        assert_eq!(parsed, EntityType::Unknown);
    }

    #[test]
    fn node_without_type_tag_defaults_to_unknown() {
        let node: GraphNode = serde_json::from_str(r#"{"id":"n1"}"#).unwrap();
        assert_eq!(node.entity_type, EntityType::Unknown);
    }

    #[test]
    fn relation_kind_parses_snake_case_tags() {
        let parsed: RelationKind = serde_json::from_str("\"hosted_on\"").unwrap();
        assert_eq!(parsed, RelationKind::HostedOn);
        let parsed: RelationKind = serde_json::from_str("\"flow\"").unwrap();
        assert_eq!(parsed, RelationKind::Flow);
        let parsed: RelationKind = serde_json::from_str("\"teleports\"").unwrap();
        assert_eq!(parsed, RelationKind::Other);
    }

    #[test]
    fn display_name_honors_priority_order() {
        let mut node = GraphNode::new("n1", EntityType::Website);
        node.url = Some("https://example.test".to_string());
        node.name = Some("home".to_string());
        assert_eq!(node.display_name(), Some("home"));

        node.name = None;
        assert_eq!(node.display_name(), Some("https://example.test"));
    }

    #[test]
    fn display_name_skips_empty_fields() {
        let mut node = GraphNode::new("n1", EntityType::Pde);
        node.name = Some(String::new());
        node.pde_key = Some("pde-7".to_string());
        assert_eq!(node.display_name(), Some("pde-7"));
    }

    #[test]
    fn display_name_is_none_without_name_fields() {
        let node = GraphNode::new("n1", EntityType::Server);
        assert_eq!(node.display_name(), None);
    }

    #[test]
    fn payload_requires_nodes_and_edges() {
        assert!(serde_json::from_str::<GraphPayload>(r#"{"nodes":[]}"#).is_err());
        assert!(serde_json::from_str::<GraphPayload>(r#"{"edges":[]}"#).is_err());
        assert!(serde_json::from_str::<GraphPayload>(r#"{"nodes":[],"edges":[]}"#).is_ok());
    }
}
