//! Snapshot exports. Both writers read the engine's current state
//! synchronously; an in-flight load does not affect them.

use crate::engine::{GraphEngine, ImageOptions};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PNG_FILENAME: &str = "lineage.png";
pub const JSON_FILENAME: &str = "lineage.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Write the pretty-printed graph snapshot to `{dir}/lineage.json`.
pub fn export_json<E: GraphEngine>(engine: &E, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(JSON_FILENAME);
    let body = serde_json::to_string_pretty(&engine.snapshot())?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Render the full graph bounds at 2x scale over the viewer background and
/// write it to `{dir}/lineage.png`.
pub fn export_png<E: GraphEngine>(engine: &E, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(PNG_FILENAME);
    let img = engine.render_image(&ImageOptions::default());
    img.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GraphSnapshot, LineageGraph};
    use lineascope_client::{EntityType, GraphNode, GraphSink};

    fn engine_with_node() -> LineageGraph {
        let mut engine = LineageGraph::new();
        engine.add_nodes(vec![GraphNode::new("n1", EntityType::Website).with_name("home")]);
        engine
    }

    #[test]
    fn json_export_writes_parseable_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_node();

        let path = export_json(&engine, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "lineage.json");

        let body = std::fs::read_to_string(&path).unwrap();
        // Pretty-printed output spans multiple lines.
        assert!(body.lines().count() > 1);
        let snapshot: GraphSnapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, "n1");
    }

    #[test]
    fn png_export_writes_decodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_node();

        let path = export_png(&engine, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "lineage.png");

        let img = image::open(&path).unwrap().to_rgba8();
        assert!(img.width() > 0 && img.height() > 0);
    }
}
