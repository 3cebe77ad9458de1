use anyhow::{Context, Result};
use apihero::handlers::{
    handle_export, handle_preview, handle_query, handle_tree, load_snapshot, resolve_path,
};
use apihero::logging::init_logging;
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    init_logging(chosen_command.get_flag("verbose"));

    if let Err(e) = run(&chosen_command).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(chosen_command: &ArgMatches) -> Result<()> {
    let quiet = chosen_command.get_flag("quiet");

    let Some((name, sub_matches)) = chosen_command.subcommand() else {
        // No subcommand provided, just show usage
        command_argument_builder().print_help()?;
        return Ok(());
    };

    let source = chosen_command
        .get_one::<String>("source")
        .context("no record source given")?;
    let snapshot = load_snapshot(&resolve_path(source), quiet).await?;

    match name {
        "tree" => handle_tree(sub_matches, &snapshot, quiet),
        "query" => handle_query(sub_matches, &snapshot),
        "preview" => handle_preview(sub_matches, &snapshot),
        "export" => handle_export(sub_matches, &snapshot),
        _ => unreachable!("clap should ensure we don't get here"),
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
