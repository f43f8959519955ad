use crate::CLAP_STYLING;
use clap::{arg, command};

fn query_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-a --"api" <URL>)
            .required(false)
            .help("Lineage API base URL (default: http://localhost:8000)"),
    )
    .arg(
        arg!(-m --"mode" <MODE>)
            .required(false)
            .help("Root key mode: anchor the query on a site or a PDE")
            .value_parser(["site", "pde"])
            .default_value("site"),
    )
    .arg(
        arg!(-k --"key" <KEY>)
            .required(true)
            .help("Root entity key to expand the lineage from"),
    )
    .arg(
        arg!(-n --"hops" <N>)
            .required(false)
            .help("Maximum traversal depth")
            .value_parser(clap::value_parser!(u32))
            .default_value("4"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("lineascope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("lineascope")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(query_args(
            command!("view").about("Open the interactive lineage viewer"),
        ))
        .subcommand(
            query_args(command!("fetch").about(
                "Fetch a lineage subgraph and print a summary (or the raw payload) to stdout",
            ))
            .arg(
                arg!(--"json")
                    .required(false)
                    .help("Print the raw graph payload as JSON instead of a summary")
                    .action(clap::ArgAction::SetTrue),
            ),
        )
        .subcommand(
            query_args(
                command!("export")
                    .about("Fetch a lineage subgraph and write lineage.png and lineage.json"),
            )
            .arg(
                arg!(-o --"output" <DIR>)
                    .required(false)
                    .help("Directory to write the export files into")
                    .default_value("."),
            ),
        )
        .subcommand(
            command!("legend").about("Print the entity-type legend with its assigned colors"),
        )
        .subcommand(
            command!("health")
                .about("Probe the lineage API health endpoint")
                .arg(
                    arg!(-a --"api" <URL>)
                        .required(false)
                        .help("Lineage API base URL (default: http://localhost:8000)"),
                ),
        )
}
