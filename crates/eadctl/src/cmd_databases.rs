use anyhow::{Context, Result};
use ead_archive::{distinct_database_names, list_resources};
use tracing::info;

use crate::common::{self, GlobalArgs};

pub async fn run(args: &GlobalArgs, distinct: bool) -> Result<()> {
    let mirror = common::require_mirror(args)?;
    let resources = list_resources(|path| common::read_mirror(mirror, path))
        .await
        .context("list tree database resources")?;
    info!(count = resources.len(), "listed resources");

    if distinct {
        let names = distinct_database_names(&resources);
        if args.json {
            common::print_json(&names)?;
        } else {
            for name in names {
                println!("{name}");
            }
        }
        return Ok(());
    }

    if args.json {
        common::print_json(&resources)?;
        return Ok(());
    }

    if resources.is_empty() {
        println!("No resources found.");
        return Ok(());
    }

    println!(
        "{:<40} {:<24} {:<26} {}",
        "NAME", "ID", "MODIFIED", "SIZE"
    );
    for resource in &resources {
        println!(
            "{:<40} {:<24} {:<26} {}",
            resource.combined_name(),
            resource.id(),
            resource.last_updated.as_deref().unwrap_or("-"),
            resource.size.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
