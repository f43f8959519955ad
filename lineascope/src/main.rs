use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use lineascope_client::{GraphLoader, GraphPayload, QueryMode};
use lineascope_core::{
    GraphEngine, LineageGraph, base_style, export_json, export_png, legend_entries, print_banner,
    resolve_api_base,
};
use lineascope_tui::ViewerOptions;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("view", primary_command)) => handle_view(primary_command),
        Some(("fetch", primary_command)) => handle_fetch(primary_command).await,
        Some(("export", primary_command)) => handle_export(primary_command).await,
        Some(("legend", _)) => handle_legend(),
        Some(("health", primary_command)) => handle_health(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

/// Shared --api/--mode/--key/--hops extraction for the query subcommands.
fn query_params(args: &ArgMatches) -> (String, QueryMode, String, u32) {
    let api = resolve_api_base(args.get_one::<String>("api").map(|s| s.as_str()), None);
    let mode = args
        .get_one::<String>("mode")
        .and_then(|s| QueryMode::from_str(s))
        .unwrap_or(QueryMode::Site);
    let key = args.get_one::<String>("key").unwrap().clone();
    let hops = *args.get_one::<u32>("hops").unwrap();
    (api, mode, key, hops)
}

fn fetch_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}

// Handler functions
fn handle_view(args: &ArgMatches) {
    let (api_base, mode, key, hops) = query_params(args);

    let options = ViewerOptions {
        api_base,
        mode,
        key,
        hops,
    };

    if let Err(e) = lineascope_tui::run(options) {
        eprintln!("Error running viewer: {}", e);
        std::process::exit(1);
    }
}

async fn handle_fetch(args: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let (api_base, mode, key, hops) = query_params(args);
    let raw_json = args.get_flag("json");

    let loader = GraphLoader::new(api_base);
    let spinner = fetch_spinner(format!("Fetching lineage for {}={}...", mode.key_param(), key));

    match loader.fetch_graph(mode, &key, hops).await {
        Ok(payload) => {
            spinner.finish_and_clear();
            if raw_json {
                match serde_json::to_string_pretty(&payload) {
                    Ok(body) => println!("{}", body),
                    Err(e) => {
                        eprintln!("✗ Failed to serialize payload: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_fetch_summary(&payload);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("✗ Fetch failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_fetch_summary(payload: &GraphPayload) {
    println!(
        "\n✓ {} nodes, {} edges\n",
        payload.nodes.len(),
        payload.edges.len()
    );

    let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for node in &payload.nodes {
        *type_counts.entry(node.entity_type.as_str()).or_insert(0) += 1;
    }
    if !type_counts.is_empty() {
        println!("Nodes by type:");
        for (entity_type, count) in &type_counts {
            println!("  {:<10} {}", entity_type, count);
        }
    }

    let mut relation_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for edge in &payload.edges {
        let label = edge.label.map(|l| l.as_str()).unwrap_or("(unlabeled)");
        *relation_counts.entry(label).or_insert(0) += 1;
    }
    if !relation_counts.is_empty() {
        println!("\nEdges by relation:");
        for (relation, count) in &relation_counts {
            println!("  {:<12} {}", relation, count);
        }
    }
}

async fn handle_export(args: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let (api_base, mode, key, hops) = query_params(args);
    let output = args.get_one::<String>("output").unwrap();
    let expanded_output = shellexpand::tilde(output);
    let output_dir = Path::new(expanded_output.as_ref());

    let loader = GraphLoader::new(api_base);
    let mut engine = LineageGraph::new();
    engine.apply_style(base_style());

    let spinner = fetch_spinner(format!("Fetching lineage for {}={}...", mode.key_param(), key));

    if let Err(e) = loader.load(&mut engine, mode, &key, hops).await {
        spinner.finish_and_clear();
        eprintln!("✗ Fetch failed: {}", e);
        std::process::exit(1);
    }

    spinner.set_message("Writing exports...");

    let png_path = match export_png(&engine, output_dir) {
        Ok(path) => path,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("✗ PNG export failed: {}", e);
            std::process::exit(1);
        }
    };
    let json_path = match export_json(&engine, output_dir) {
        Ok(path) => path,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("✗ JSON export failed: {}", e);
            std::process::exit(1);
        }
    };

    spinner.finish_and_clear();
    println!("✓ Wrote {}", png_path.display());
    println!("✓ Wrote {}", json_path.display());
}

fn handle_legend() {
    println!("Entity types:\n");
    for entry in legend_entries() {
        println!(
            "  {} {}",
            "  ".on_truecolor(entry.color.r, entry.color.g, entry.color.b),
            entry.label
        );
    }
}

async fn handle_health(args: &ArgMatches) {
    let api = resolve_api_base(args.get_one::<String>("api").map(|s| s.as_str()), None);
    let loader = GraphLoader::new(api);

    match loader.health().await {
        Ok(true) => println!("✓ {} is healthy", loader.api_base()),
        Ok(false) => {
            eprintln!("✗ {} reports unhealthy", loader.api_base());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
