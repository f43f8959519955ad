pub mod error;
pub mod loader;
pub mod model;

pub use error::LoadError;
pub use loader::{GraphLoader, GraphSink, QueryMode};
pub use model::{EntityType, GraphEdge, GraphNode, GraphPayload, OperationKind, RelationKind};
