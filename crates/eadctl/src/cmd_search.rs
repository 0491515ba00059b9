use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::common::{self, EntryView, GlobalArgs, Session};

#[derive(Serialize)]
struct SearchResult<'a> {
    query: &'a str,
    hits: usize,
    entries: Vec<EntryView>,
}

pub async fn run(args: &GlobalArgs, source: String, query: String) -> Result<()> {
    let session = Session::open(args).await?;
    let mut tree = session.load_tree(&source, args.mirror.as_deref()).await?;
    let hits = tree.search(&query);
    info!(%query, hits, "search finished");
    let listed = tree.search_list();

    if args.json {
        let payload = SearchResult {
            query: &query,
            hits,
            entries: listed
                .iter()
                .map(|node| EntryView::new(&tree, *node))
                .collect(),
        };
        return common::print_json(&payload);
    }

    if hits == 0 {
        println!("No entries match '{query}'.");
        return Ok(());
    }
    for node in listed {
        let marker = if tree[node].search_hit { '*' } else { ' ' };
        println!("{}", common::entry_line(&tree, node, marker));
    }
    println!("{hits} hit(s)");
    Ok(())
}
