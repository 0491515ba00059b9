use anyhow::{Context, Result};
use ead_archive::{Area, ArchiveMetadataField};
use serde::Serialize;

use crate::common::{self, EntryView, GlobalArgs, Session};

#[derive(Serialize)]
struct AreaView<'a> {
    area: Area,
    title: &'static str,
    fields: Vec<&'a ArchiveMetadataField>,
}

#[derive(Serialize)]
struct EntryDetails<'a> {
    #[serde(flatten)]
    entry: EntryView,
    description_level: Option<&'a str>,
    path: Vec<String>,
    areas: Vec<AreaView<'a>>,
}

pub async fn run(args: &GlobalArgs, source: String, id: String) -> Result<()> {
    let session = Session::open(args).await?;
    let mut tree = session.load_tree(&source, args.mirror.as_deref()).await?;
    let node = tree.require(&id)?;

    if let Some(resolver) = session.resolver.as_ref() {
        tree.associated_record_pi(node, resolver)
            .with_context(|| format!("look up record of {id}"))?;
    }

    let path: Vec<String> = tree
        .ancestors(node, false)
        .into_iter()
        .map(|ancestor| tree[ancestor].display_label().to_string())
        .collect();
    let entry = &tree[node];
    let areas: Vec<AreaView> = Area::ALL
        .iter()
        .map(|area| AreaView {
            area: *area,
            title: area.title(),
            fields: entry
                .area(*area)
                .iter()
                .filter(|field| field.is_filled())
                .collect(),
        })
        .filter(|view| !view.fields.is_empty())
        .collect();

    if args.json {
        let details = EntryDetails {
            entry: EntryView::new(&tree, node),
            description_level: entry.description_level.as_deref(),
            path,
            areas,
        };
        return common::print_json(&details);
    }

    println!("{} ({})", entry.display_label(), entry.id);
    if !path.is_empty() {
        println!("Path: {}", path.join(" > "));
    }
    println!("Type: {}", entry.node_type);
    if let Some(level) = entry.description_level.as_deref() {
        println!("Level: {level}");
    }
    match entry.record.pi() {
        Some(pi) => println!("Record: {pi}"),
        None if entry.record.is_resolved() => println!("Record: none"),
        None => {}
    }
    for view in areas {
        println!();
        println!("{}", view.title);
        for field in view.fields {
            let values: Vec<&str> = field
                .values
                .iter()
                .filter(|value| !value.is_empty())
                .map(|value| value.value.trim())
                .collect();
            println!("  {}: {}", field.label, values.join("; "));
        }
    }
    Ok(())
}
