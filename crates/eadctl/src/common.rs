use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use ead_archive::{
    load_associated_records, ArchiveTree, EadParser, FieldTable, MapResolver, NodeId,
    RecordResolver,
};
use ead_xml::XmlError;
use serde::Serialize;
use tracing::{debug, info};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub json: bool,
    pub fields: Option<PathBuf>,
    pub records: Option<PathBuf>,
    pub mirror: Option<PathBuf>,
}

/// Parser and optional record resolver assembled from the global options.
pub struct Session {
    pub parser: EadParser,
    pub resolver: Option<MapResolver>,
}

impl Session {
    pub async fn open(args: &GlobalArgs) -> Result<Self> {
        let fields = load_fields(args.fields.as_deref()).await?;
        let resolver = match args.records.as_deref() {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("read record map {}", path.display()))?;
                Some(MapResolver::from_json(&text).context("parse record map")?)
            }
            None => None,
        };
        let records = load_associated_records(
            resolver.as_ref().map(|resolver| resolver as &dyn RecordResolver),
        )
        .context("load associated records")?;
        let parser = EadParser::new(fields).with_records(records);
        Ok(Self { parser, resolver })
    }

    /// Load the tree named by `source`.
    ///
    /// With a mirror, `source` is `<database>/<resource>`; otherwise it is the
    /// path of an EAD file.
    pub async fn load_tree(&self, source: &str, mirror: Option<&Path>) -> Result<ArchiveTree> {
        let doc = match mirror {
            Some(mirror) => {
                let (database, resource) = source
                    .split_once('/')
                    .ok_or_else(|| anyhow!("expected <database>/<resource>, got '{source}'"))?;
                ead_xml::fetch_document(|path| read_mirror(mirror, path), database, resource)
                    .await
                    .with_context(|| format!("load {source} from mirror"))?
            }
            None => {
                let text = tokio::fs::read_to_string(source)
                    .await
                    .with_context(|| format!("read {source}"))?;
                ead_xml::parse(&text).with_context(|| format!("parse {source}"))?
            }
        };
        let tree = self
            .parser
            .parse_document(&doc)
            .with_context(|| format!("build archive tree from {source}"))?;
        info!(entries = tree.len(), "loaded archive tree");
        Ok(tree)
    }
}

async fn load_fields(path: Option<&Path>) -> Result<FieldTable> {
    let Some(path) = path else {
        return Ok(FieldTable::default_ead());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read field table {}", path.display()))?;
    let table = if text.trim_start().starts_with('<') {
        FieldTable::from_xml_config(&text)
    } else {
        FieldTable::from_json(&text)
    }
    .with_context(|| format!("load field table {}", path.display()))?;
    debug!(fields = table.len(), "using custom field table");
    Ok(table)
}

/// Location of a tree database path inside a local mirror directory.
pub fn mirror_file(mirror: &Path, path: &str) -> Result<PathBuf> {
    let mut file = mirror.to_path_buf();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        let segment = urlencoding::decode(segment)
            .with_context(|| format!("decode path segment '{segment}'"))?;
        if segment == ".." || segment.contains('/') {
            bail!("path segment '{segment}' escapes the mirror");
        }
        file.push(&*segment);
    }
    Ok(file)
}

/// Serve a tree database request from the mirror directory.
pub async fn read_mirror(mirror: &Path, path: String) -> Result<String, XmlError> {
    let file = mirror_file(mirror, &path).map_err(|err| XmlError::Transport(err.to_string()))?;
    debug!(file = %file.display(), "reading from mirror");
    tokio::fs::read_to_string(&file)
        .await
        .map_err(|err| XmlError::Transport(format!("{}: {err}", file.display())))
}

pub fn require_mirror(args: &GlobalArgs) -> Result<&Path> {
    args.mirror
        .as_deref()
        .ok_or_else(|| anyhow!("this command needs --mirror DIR"))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

/// Compact description of an entry for listings.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: String,
    pub label: String,
    pub node_type: String,
    pub level: i32,
    pub order: usize,
    pub children: usize,
    pub expanded: bool,
    pub visible: bool,
    pub search_hit: bool,
    pub contains_image: bool,
    pub pi: Option<String>,
}

impl EntryView {
    pub fn new(tree: &ArchiveTree, node: NodeId) -> Self {
        let entry = &tree[node];
        Self {
            id: entry.id.clone(),
            label: entry.display_label().to_string(),
            node_type: entry.node_type.clone(),
            level: entry.hierarchy_level(),
            order: entry.order_number(),
            children: entry.children().len(),
            expanded: entry.expanded,
            visible: entry.visible,
            search_hit: entry.search_hit,
            contains_image: entry.contains_image,
            pi: entry.record.pi().map(str::to_string),
        }
    }
}

/// One indented line per entry: marker, label, node type and id.
pub fn entry_line(tree: &ArchiveTree, node: NodeId, marker: char) -> String {
    let entry = &tree[node];
    let depth = usize::try_from(entry.hierarchy_level()).unwrap_or(0);
    format!(
        "{marker} {}{} [{}] ({})",
        "  ".repeat(depth),
        entry.display_label(),
        entry.node_type,
        entry.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ead_archive::ArchiveEntry;

    #[test]
    fn mirror_paths_are_decoded() {
        let file = mirror_file(Path::new("/srv/mirror"), "db/my%20archive/fonds.xml").unwrap();
        assert_eq!(file, PathBuf::from("/srv/mirror/db/my archive/fonds.xml"));
        let listing = mirror_file(Path::new("/srv/mirror"), "databases").unwrap();
        assert_eq!(listing, PathBuf::from("/srv/mirror/databases"));
    }

    #[test]
    fn mirror_paths_cannot_escape() {
        assert!(mirror_file(Path::new("/srv/mirror"), "db/%2E%2E/secret").is_err());
        assert!(mirror_file(Path::new("/srv/mirror"), "db/a%2Fb/x.xml").is_err());
    }

    #[test]
    fn entry_lines_are_indented_by_level() {
        let mut tree = ArchiveTree::new(ArchiveEntry::new("root").with_label("Fonds"));
        let root = tree.root();
        let child = tree.insert(ArchiveEntry::new("c1").with_label("Letters"));
        tree.add_child(root, child).unwrap();
        tree.update_hierarchy(root);
        assert_eq!(entry_line(&tree, root, ' '), "  Fonds [folder] (root)");
        assert_eq!(entry_line(&tree, child, '*'), "*   Letters [folder] (c1)");
    }
}
