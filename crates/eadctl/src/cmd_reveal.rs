use anyhow::Result;
use tracing::info;

use crate::common::{self, EntryView, GlobalArgs, Session};

pub async fn run(args: &GlobalArgs, source: String, id: String) -> Result<()> {
    let session = Session::open(args).await?;
    let mut tree = session.load_tree(&source, args.mirror.as_deref()).await?;
    let node = tree.require(&id)?;

    tree.collapse_all();
    let root = tree.root();
    tree.expand(root);
    tree.expand_up(node);
    let visible = tree.visible_list();
    info!(entry = %id, visible = visible.len(), "revealed entry");

    if args.json {
        let views: Vec<EntryView> = visible
            .iter()
            .map(|current| EntryView::new(&tree, *current))
            .collect();
        return common::print_json(&views);
    }

    for current in visible {
        let marker = if current == node {
            '>'
        } else if tree[current].expanded {
            '-'
        } else if tree.has_children(current) {
            '+'
        } else {
            ' '
        };
        println!("{}", common::entry_line(&tree, current, marker));
    }
    Ok(())
}
