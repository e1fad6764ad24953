use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::store::IncidentStore;

/// Loads the session store, starting empty when the file does not exist yet.
pub fn load(path: &Path) -> anyhow::Result<IncidentStore> {
    if !path.exists() {
        log::debug!("No snapshot at {}, starting empty", path.display());
        return Ok(IncidentStore::new());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let store: IncidentStore = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid incident snapshot", path.display()))?;
    store
        .verify()
        .with_context(|| format!("{} is inconsistent", path.display()))?;

    log::debug!("Loaded {} incidents from {}", store.len(), path.display());
    Ok(store)
}

/// Writes the store next to `path` first and renames it into place, so an
/// interrupted save leaves the previous snapshot intact.
pub fn save(store: &IncidentStore, path: &Path) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(store)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage a snapshot in {}", dir.display()))?;
    staged
        .write_all(raw.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .with_context(|| format!("failed to write {}", path.display()))?;
    staged
        .persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    log::debug!("Saved {} incidents to {}", store.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::pothole_draft;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = load(&dir.path().join("incidents.json")).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn saved_store_keeps_ids_and_counter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("incidents.json");

        let mut store = IncidentStore::new();
        let first = store.add(pothole_draft()).expect("add");
        store.approve(&first.id).expect("approve");
        save(&store, &path).expect("save");

        let mut reloaded = load(&path).expect("load");
        assert_eq!(reloaded.get(&first.id), store.get(&first.id));

        let second = reloaded.add(pothole_draft()).expect("add");
        assert_ne!(second.id, first.id);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("incidents.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(load(&path).is_err());
    }

    #[test]
    fn resaving_replaces_the_snapshot_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("incidents.json");

        let mut store = IncidentStore::new();
        let first = store.add(pothole_draft()).expect("add");
        save(&store, &path).expect("first save");
        store.reject(&first.id).expect("reject");
        store.add(pothole_draft()).expect("add");
        save(&store, &path).expect("second save");

        let reloaded = load(&path).expect("load");
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&first.id), store.get(&first.id));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("incidents.json")]);
    }

    #[test]
    fn inconsistent_snapshot_names_the_problem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("incidents.json");

        let mut store = IncidentStore::new();
        store.add(pothole_draft()).expect("add");
        let mut value = serde_json::to_value(&store).expect("json");
        let incidents = value["incidents"].as_array_mut().expect("incidents");
        let copy = incidents[0].clone();
        incidents.push(copy);
        std::fs::write(&path, value.to_string()).expect("write");

        let err = load(&path).expect_err("duplicate ids");
        let chain = format!("{err:#}");
        assert!(chain.contains("is inconsistent"));
        assert!(chain.contains("duplicate incident id RPT-001"));
    }
}
