use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eadctl::cmd_databases;
use eadctl::cmd_reveal;
use eadctl::cmd_search;
use eadctl::cmd_show;
use eadctl::cmd_tree;
use eadctl::common::GlobalArgs;

#[derive(Parser, Debug)]
#[command(name = "eadctl", version, about = "EAD finding aid browser")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    /// Field descriptor table (JSON array or XML metadata list)
    #[arg(long)]
    fields: Option<PathBuf>,
    /// Record map JSON keyed by entry id
    #[arg(long)]
    records: Option<PathBuf>,
    /// Local mirror of the tree database (`databases`, `db/<database>/<resource>`)
    #[arg(long)]
    mirror: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List finding aids stored in the mirror
    Databases {
        /// Print each database name once
        #[arg(long)]
        distinct: bool,
    },
    /// Print the entry tree
    Tree {
        /// EAD file, or <database>/<resource> with --mirror
        source: String,
        /// Include every level instead of the root and its children
        #[arg(long)]
        all: bool,
    },
    /// Highlight entries by id or label
    Search {
        source: String,
        #[arg(long, short)]
        query: String,
    },
    /// Show the metadata of one entry
    Show {
        source: String,
        #[arg(long)]
        id: String,
    },
    /// Collapse the tree and expand the path to one entry
    Reveal {
        source: String,
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        verbose,
        json,
        fields,
        records,
        mirror,
        cmd,
    } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = GlobalArgs {
        json,
        fields,
        records,
        mirror,
    };

    match cmd {
        Cmd::Databases { distinct } => cmd_databases::run(&args, distinct).await?,
        Cmd::Tree { source, all } => cmd_tree::run(&args, source, all).await?,
        Cmd::Search { source, query } => cmd_search::run(&args, source, query).await?,
        Cmd::Show { source, id } => cmd_show::run(&args, source, id).await?,
        Cmd::Reveal { source, id } => cmd_reveal::run(&args, source, id).await?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_global_options() {
        let cli = Cli::parse_from([
            "eadctl",
            "-vv",
            "--json",
            "--fields",
            "fields.json",
            "--mirror",
            "/srv/basex",
            "databases",
            "--distinct",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert_eq!(cli.fields, Some(PathBuf::from("fields.json")));
        assert_eq!(cli.mirror, Some(PathBuf::from("/srv/basex")));
        assert!(cli.records.is_none());
        match cli.cmd {
            Cmd::Databases { distinct } => assert!(distinct),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_tree_defaults() {
        let cli = Cli::parse_from(["eadctl", "tree", "fonds.xml"]);
        match cli.cmd {
            Cmd::Tree { source, all } => {
                assert_eq!(source, "fonds.xml");
                assert!(!all);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_search_query() {
        let cli = Cli::parse_from(["eadctl", "search", "archive/fonds.xml", "-q", "letters"]);
        match cli.cmd {
            Cmd::Search { source, query } => {
                assert_eq!(source, "archive/fonds.xml");
                assert_eq!(query, "letters");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn show_and_reveal_require_id() {
        assert!(Cli::try_parse_from(["eadctl", "show", "fonds.xml"]).is_err());
        let cli = Cli::parse_from([
            "eadctl",
            "--records",
            "records.json",
            "reveal",
            "fonds.xml",
            "--id",
            "c42",
        ]);
        assert_eq!(cli.records, Some(PathBuf::from("records.json")));
        match cli.cmd {
            Cmd::Reveal { id, .. } => assert_eq!(id, "c42"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
