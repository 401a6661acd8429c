//! Modem discovery
//!
//! Modems are laid out as `<root>/<manufacturer>/<model>/`. A directory counts
//! as a mockable modem when its `modem.yaml` loads and at least one declared
//! page has a fixture. Anything else is skipped so one broken definition never
//! hides its siblings.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{list_modem_fixtures, ModemConfig};
use crate::ModemDescriptor;

/// Lazily scan `root` for mockable modems.
///
/// Every call walks the filesystem again; nothing is cached between calls.
pub fn discover_modems(root: &Path) -> impl Iterator<Item = (PathBuf, ModemConfig)> {
    WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|entry| {
            let path = entry.into_path();
            match ModemConfig::load(&path) {
                Ok(config) => Some((path, config)),
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    None
                }
            }
        })
        .filter(|(path, _)| match list_modem_fixtures(path) {
            Ok(keys) if !keys.is_empty() => true,
            Ok(_) => {
                debug!("Skipping {}: no fixtures", path.display());
                false
            }
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                false
            }
        })
}

/// Descriptors of every mockable modem under `root`
pub fn discover_descriptors(root: &Path) -> impl Iterator<Item = ModemDescriptor> {
    discover_modems(root).map(|(path, config)| config.descriptor(&path))
}

/// Find one modem by manufacturer and model (case-insensitive)
pub fn find_modem(root: &Path, manufacturer: &str, model: &str) -> Option<(PathBuf, ModemConfig)> {
    discover_modems(root).find(|(_, config)| {
        config.manufacturer.eq_ignore_ascii_case(manufacturer)
            && config.model.eq_ignore_ascii_case(model)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MODEM_CONFIG_FILE;
    use crate::fixtures::FIXTURES_DIR;
    use tempfile::TempDir;

    fn write_modem(root: &Path, manufacturer: &str, model: &str, yaml: &str, fixture: Option<&str>) {
        let dir = root.join(manufacturer).join(model);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MODEM_CONFIG_FILE), yaml).unwrap();
        if let Some(name) = fixture {
            std::fs::create_dir_all(dir.join(FIXTURES_DIR)).unwrap();
            std::fs::write(dir.join(FIXTURES_DIR).join(name), "<html/>").unwrap();
        }
    }

    fn good_yaml(manufacturer: &str, model: &str) -> String {
        format!(
            "manufacturer: {manufacturer}\nmodel: {model}\nauth: {{types: [none]}}\n\
             pages:\n  data:\n    status: {{url: /status.html, fixture: status.html}}\n"
        )
    }

    #[test]
    fn test_discovers_only_valid_modems() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_modem(root, "arris", "sb8200", &good_yaml("Arris", "SB8200"), Some("status.html"));
        write_modem(root, "netgear", "cm600", &good_yaml("Netgear", "CM600"), Some("status.html"));
        // malformed yaml
        write_modem(root, "broken", "x1", "manufacturer: [", Some("status.html"));
        // missing required field
        write_modem(root, "broken", "x2", "model: X2\n", Some("status.html"));
        // valid config, no fixtures
        write_modem(root, "motorola", "mb7621", &good_yaml("Motorola", "MB7621"), None);
        // fixture present but not referenced
        write_modem(root, "technicolor", "tc4400", &good_yaml("Technicolor", "TC4400"), Some("other.html"));
        // too shallow / too deep
        std::fs::write(root.join(MODEM_CONFIG_FILE), good_yaml("Root", "Level")).unwrap();
        write_modem(&root.join("arris").join("sb8200"), "nested", "deep", &good_yaml("Deep", "One"), Some("status.html"));

        let found: Vec<_> = discover_descriptors(root).collect();
        let models: Vec<_> = found.iter().map(|d| d.model.as_str()).collect();
        assert_eq!(models, vec!["SB8200", "CM600"]);
        assert_eq!(found[0].path, root.join("arris").join("sb8200"));
    }

    #[test]
    fn test_rescans_each_call() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        assert_eq!(discover_modems(root).count(), 0);

        write_modem(root, "arris", "sb6190", &good_yaml("Arris", "SB6190"), Some("status.html"));
        assert_eq!(discover_modems(root).count(), 1);
        assert_eq!(discover_modems(root).count(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(discover_modems(&tmp.path().join("absent")).count(), 0);
    }

    #[test]
    fn test_find_modem_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        write_modem(tmp.path(), "arris", "sb8200", &good_yaml("Arris", "SB8200"), Some("status.html"));

        let (path, config) = find_modem(tmp.path(), "arris", "sb8200").unwrap();
        assert_eq!(config.model, "SB8200");
        assert!(path.ends_with("arris/sb8200"));
        assert!(find_modem(tmp.path(), "arris", "sb6190").is_none());
    }
}
