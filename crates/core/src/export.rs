use crate::model::*;

/// Writes one row per node, parents before their children.
pub fn to_csv(tree: &Tree, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["path", "name", "kind", "size", "mode", "modified", "extension"])?;

    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let Some(n) = tree.get(id) else { continue };
        let kind = if n.is_dir() { "dir" } else { "file" };
        writer.write_record([
            n.path.display().to_string(),
            n.info.name.clone(),
            kind.to_string(),
            n.info.size.to_string(),
            format!("{:o}", n.info.mode),
            n.info.mod_time.to_rfc3339(),
            n.info.extension().to_string(),
        ])?;
        stack.extend(n.children.iter().rev().copied());
    }
    writer.flush()?;
    Ok(())
}

/// Nested `{ path, info, children }` document rooted at the tree root.
pub fn to_json(tree: &Tree) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(tree)
}
