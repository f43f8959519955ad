//! The static legend: every known entity type paired with its encoder
//! color, in the order the viewer presents them.

use crate::encode::{Color, color_for_type};
use lineascope_client::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub entity_type: EntityType,
    pub label: &'static str,
    pub color: Color,
}

pub fn legend_entries() -> Vec<LegendEntry> {
    [
        EntityType::Website,
        EntityType::Server,
        EntityType::Software,
        EntityType::Directory,
        EntityType::Feed,
        EntityType::Pde,
        EntityType::FlowRun,
    ]
    .into_iter()
    .map(|entity_type| LegendEntry {
        entity_type,
        label: entity_type.as_str(),
        color: color_for_type(entity_type),
    })
    .collect()
}
