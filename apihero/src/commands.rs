use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("apihero")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("apihero")
        .about("Browse captured API traffic as a site map and export normalized endpoints")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log index construction details to stderr")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-s --"source" <PATH>)
                .required(false)
                .global(true)
                .help(
                    "Captured requests to index: a SQLite capture database (.db, .sqlite) \
                or a JSON / JSON-lines file",
                )
                .default_value("~/.config/apihero/capture.db"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("tree")
                .about("Print the site map of hosts and path segments with request counts")
                .arg(
                    arg!(--"report")
                        .required(false)
                        .help("Also print the build report (skipped entries) as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("query")
                .about("List the captured requests under one or more site map prefixes")
                .arg(
                    arg!(-p --"prefix" <PREFIX>)
                        .required(true)
                        .help("Site map node, e.g. https://api.example.com/users (repeatable)")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            command!("preview")
                .about("Show the normalized endpoints of a selection grouped by host and folder")
                .arg(
                    arg!(-p --"prefix" <PREFIX>)
                        .required(false)
                        .help("Site map node to include (repeatable, default: every host)")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            command!("export")
                .about("Export the normalized endpoints of a selection")
                .arg(
                    arg!(-p --"prefix" <PREFIX>)
                        .required(false)
                        .help("Site map node to include (repeatable, default: every host)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the export")
                        .default_value("apihero_export.csv"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: csv, json")
                        .value_parser(["csv", "json"])
                        .default_value("csv"),
                ),
        )
}
