use crate::error::{LoadError, Result};
use crate::model::{GraphEdge, GraphNode, GraphPayload};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

/// Which root-key parameter a lineage query is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Site,
    Pde,
}

impl QueryMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "site" => Some(QueryMode::Site),
            "pde" => Some(QueryMode::Pde),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Site => "site",
            QueryMode::Pde => "pde",
        }
    }

    /// Query-string parameter name carrying the root key for this mode.
    pub fn key_param(&self) -> &'static str {
        match self {
            QueryMode::Site => "site_key",
            QueryMode::Pde => "pde_key",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            QueryMode::Site => QueryMode::Pde,
            QueryMode::Pde => QueryMode::Site,
        }
    }
}

/// Mutation surface a load swaps a fetched graph into. Loads fully replace
/// the element set; there is no merge or diff path.
pub trait GraphSink {
    fn clear_elements(&mut self);
    fn add_nodes(&mut self, nodes: Vec<GraphNode>);
    fn add_edges(&mut self, edges: Vec<GraphEdge>);
}

#[derive(Deserialize)]
struct HealthBody {
    ok: bool,
}

/// Client for the lineage API. One loader per API base; reusable across
/// loads. No timeout is configured: a hung request stays in flight until the
/// server resolves it or the caller imposes a deadline externally.
pub struct GraphLoader {
    client: Client,
    api_base: String,
}

impl GraphLoader {
    pub fn new(api_base: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("Lineascope/0.1 (https://github.com/trapdoorsec/lineascope)")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Request URL for a lineage query. Exactly one root-key parameter is
    /// set, chosen by `mode`; `max_hops` is always set.
    pub fn request_url(&self, mode: QueryMode, key: &str, hops: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/lineage", self.api_base))
            .map_err(|e| LoadError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        url.query_pairs_mut()
            .append_pair(mode.key_param(), key)
            .append_pair("max_hops", &hops.to_string());
        Ok(url)
    }

    /// Fetch a lineage subgraph. The body is fully parsed before this
    /// returns, so a caller swapping the result into an engine never sees a
    /// partial payload.
    pub async fn fetch_graph(&self, mode: QueryMode, key: &str, hops: u32) -> Result<GraphPayload> {
        let url = self.request_url(mode, key, hops)?;
        debug!("Fetching lineage from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let payload: GraphPayload = serde_json::from_str(&body)
            .map_err(|e| LoadError::MalformedResponse(e.to_string()))?;

        info!(
            "Fetched lineage for {}={}: {} nodes, {} edges",
            mode.key_param(),
            key,
            payload.nodes.len(),
            payload.edges.len()
        );
        Ok(payload)
    }

    /// Fetch a lineage subgraph and replace the sink's element set with it.
    /// All-or-nothing: any failure happens before the clear, leaving the
    /// sink untouched. Nodes go in before the edges that reference them.
    ///
    /// Overlapping loads are not serialized; each performs its own swap and
    /// the last response to resolve determines the final state.
    pub async fn load<S: GraphSink>(
        &self,
        sink: &mut S,
        mode: QueryMode,
        key: &str,
        hops: u32,
    ) -> Result<()> {
        let GraphPayload { nodes, edges } = self.fetch_graph(mode, key, hops).await?;
        sink.clear_elements();
        sink.add_nodes(nodes);
        sink.add_edges(edges);
        Ok(())
    }

    /// Probe the API's health endpoint.
    pub async fn health(&self) -> Result<bool> {
        let url = Url::parse(&format!("{}/healthz", self.api_base))
            .map_err(|e| LoadError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Api {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let health: HealthBody = serde_json::from_str(&body)
            .map_err(|e| LoadError::MalformedResponse(e.to_string()))?;
        Ok(health.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityType;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct TestSink {
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        clears: usize,
    }

    impl GraphSink for TestSink {
        fn clear_elements(&mut self) {
            self.nodes.clear();
            self.edges.clear();
            self.clears += 1;
        }

        fn add_nodes(&mut self, nodes: Vec<GraphNode>) {
            self.nodes.extend(nodes);
        }

        fn add_edges(&mut self, edges: Vec<GraphEdge>) {
            self.edges.extend(edges);
        }
    }

    /// Lets two concurrent loads target the same element store, the way two
    /// overlapping fetches in a viewer share one engine.
    #[derive(Clone)]
    struct SharedSink(Arc<Mutex<TestSink>>);

    impl GraphSink for SharedSink {
        fn clear_elements(&mut self) {
            self.0.lock().unwrap().clear_elements();
        }

        fn add_nodes(&mut self, nodes: Vec<GraphNode>) {
            self.0.lock().unwrap().add_nodes(nodes);
        }

        fn add_edges(&mut self, edges: Vec<GraphEdge>) {
            self.0.lock().unwrap().add_edges(edges);
        }
    }

    fn payload_json(node_id: &str) -> serde_json::Value {
        serde_json::json!({
            "nodes": [{"id": node_id, "type": "Website", "name": node_id}],
            "edges": []
        })
    }

    #[test]
    fn site_mode_sets_only_site_key() {
        let loader = GraphLoader::new("http://api.test:8000");
        let url = loader.request_url(QueryMode::Site, "abc", 3).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("site_key=abc"));
        assert!(query.contains("max_hops=3"));
        assert!(!query.contains("pde_key"));
        assert_eq!(url.path(), "/lineage");
    }

    #[test]
    fn pde_mode_sets_only_pde_key() {
        let loader = GraphLoader::new("http://api.test:8000/");
        let url = loader.request_url(QueryMode::Pde, "abc", 3).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("pde_key=abc"));
        assert!(query.contains("max_hops=3"));
        assert!(!query.contains("site_key"));
    }

    #[test]
    fn unparseable_api_base_is_an_invalid_url() {
        let loader = GraphLoader::new("not a url");
        let err = loader.request_url(QueryMode::Site, "abc", 1).unwrap_err();
        assert!(matches!(err, LoadError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn successful_load_replaces_sink_elements() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lineage"))
            .and(query_param("site_key", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nodes": [
                    {"id": "n1", "type": "Website", "name": "home"},
                    {"id": "n2", "type": "Feed", "feed_key": "feed-1"}
                ],
                "edges": [
                    {"source": "n1", "target": "n2", "label": "flow", "op": "mask"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        let mut sink = TestSink::default();
        sink.nodes.push(GraphNode::new("stale", EntityType::Server));

        loader
            .load(&mut sink, QueryMode::Site, "abc", 3)
            .await
            .unwrap();

        assert_eq!(sink.clears, 1);
        assert_eq!(sink.nodes.len(), 2);
        assert_eq!(sink.nodes[0].id, "n1");
        assert_eq!(sink.nodes[0].entity_type, EntityType::Website);
        assert_eq!(sink.edges.len(), 1);
        assert_eq!(sink.edges[0].label, Some(crate::model::RelationKind::Flow));
        assert_eq!(sink.edges[0].op, Some(crate::model::OperationKind::Mask));
    }

    #[tokio::test]
    async fn http_error_surfaces_status_and_leaves_sink_untouched() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lineage"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        let mut sink = TestSink::default();
        sink.nodes.push(GraphNode::new("keep-me", EntityType::Pde));

        let err = loader
            .load(&mut sink, QueryMode::Site, "abc", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::Api { status: 500 }));
        assert_eq!(sink.clears, 0);
        assert_eq!(sink.nodes.len(), 1);
        assert_eq!(sink.nodes[0].id, "keep-me");
    }

    #[tokio::test]
    async fn unparseable_body_is_a_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lineage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        let mut sink = TestSink::default();

        let err = loader
            .load(&mut sink, QueryMode::Site, "abc", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::MalformedResponse(_)));
        assert_eq!(sink.clears, 0);
    }

    #[tokio::test]
    async fn error_object_body_is_a_malformed_response() {
        // The upstream API answers 200 with {"error": ...} when no root key
        // is supplied; that shape has no nodes/edges and must not clear the
        // current graph.
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lineage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "Provide either pde_key or site_key"})),
            )
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        let mut sink = TestSink::default();
        sink.nodes.push(GraphNode::new("keep-me", EntityType::Feed));

        let err = loader
            .load(&mut sink, QueryMode::Site, "abc", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::MalformedResponse(_)));
        assert_eq!(sink.nodes.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_loads_last_response_wins() {
        let mock_server = MockServer::start().await;

        // Load A answers slowly, load B immediately: B lands first and is
        // then overwritten when A resolves. Issue order does not matter.
        Mock::given(method("GET"))
            .and(path("/lineage"))
            .and(query_param("site_key", "a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(payload_json("from-a"))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/lineage"))
            .and(query_param("site_key", "b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload_json("from-b")))
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        let store = Arc::new(Mutex::new(TestSink::default()));
        let mut sink_a = SharedSink(store.clone());
        let mut sink_b = SharedSink(store.clone());

        let (result_a, result_b) = tokio::join!(
            loader.load(&mut sink_a, QueryMode::Site, "a", 2),
            loader.load(&mut sink_b, QueryMode::Site, "b", 2),
        );
        result_a.unwrap();
        result_b.unwrap();

        let sink = store.lock().unwrap();
        assert_eq!(sink.clears, 2);
        assert_eq!(sink.nodes.len(), 1);
        assert_eq!(sink.nodes[0].id, "from-a");
    }

    #[tokio::test]
    async fn health_reads_ok_flag() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let loader = GraphLoader::new(mock_server.uri());
        assert!(loader.health().await.unwrap());
    }

    #[test]
    fn query_mode_parses_cli_names() {
        assert_eq!(QueryMode::from_str("site"), Some(QueryMode::Site));
        assert_eq!(QueryMode::from_str("PDE"), Some(QueryMode::Pde));
        assert_eq!(QueryMode::from_str("graph"), None);
        assert_eq!(QueryMode::Site.toggled(), QueryMode::Pde);
    }
}
