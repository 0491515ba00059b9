use anyhow::Result;

use crate::common::{self, EntryView, GlobalArgs, Session};

pub async fn run(args: &GlobalArgs, source: String, all: bool) -> Result<()> {
    let session = Session::open(args).await?;
    let tree = session.load_tree(&source, args.mirror.as_deref()).await?;
    let nodes = tree.flatten(tree.root(), all);

    if args.json {
        let views: Vec<EntryView> = nodes
            .iter()
            .map(|node| EntryView::new(&tree, *node))
            .collect();
        return common::print_json(&views);
    }

    for node in nodes {
        let marker = if tree.has_children(node) { '+' } else { ' ' };
        println!("{}", common::entry_line(&tree, node, marker));
    }
    Ok(())
}
