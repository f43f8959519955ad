pub mod api;
pub mod encode;
pub mod engine;
pub mod export;
pub mod legend;

pub use api::resolve_api_base;
pub use encode::{
    Color, Shape, StyleRuleset, base_style, color_for_type, edge_color, edge_label, label_for,
    shape_for_type,
};
pub use engine::{GraphEngine, GraphSnapshot, ImageOptions, LineageGraph, Position};
pub use export::{ExportError, export_json, export_png};
pub use legend::{LegendEntry, legend_entries};

pub fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════════════════════╗
    ║  ██╗     ██╗███╗   ██╗███████╗ █████╗                 ║
    ║  ██║     ██║████╗  ██║██╔════╝██╔══██╗                ║
    ║  ██║     ██║██╔██╗ ██║█████╗  ███████║                ║
    ║  ██║     ██║██║╚██╗██║██╔══╝  ██╔══██║                ║
    ║  ███████╗██║██║ ╚████║███████╗██║  ██║                ║
    ║  ╚══════╝╚═╝╚═╝  ╚═══╝╚══════╝╚═╝  ╚═╝                ║
    ║        ███████╗ ██████╗ ██████╗ ██████╗ ███████╗      ║
    ║        ██╔════╝██╔════╝██╔═══██╗██╔══██╗██╔════╝      ║
    ║        ███████╗██║     ██║   ██║██████╔╝█████╗        ║
    ║        ╚════██║██║     ██║   ██║██╔═══╝ ██╔══╝        ║
    ║        ███████║╚██████╗╚██████╔╝██║     ███████╗      ║
    ║        ╚══════╝ ╚═════╝ ╚═════╝ ╚═╝     ╚══════╝      ║
    ║                                                       ║
    ║            data lineage, in your terminal             ║
    ╚═══════════════════════════════════════════════════════╝
    "#;
    println!("{}", banner);
}
