//! Plugin discovery - recursive directory walk and manifest index

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use hearth_plugin_api::PluginManifest;

use super::error::PluginHostError;

/// File that marks a directory as a plugin root
pub const PLUGIN_MANIFEST: &str = "plugin.toml";

/// One discovered plugin directory with its parsed manifest
#[derive(Debug, Clone)]
pub struct DiscoveredPlugin {
    /// Directory that directly contains `plugin.toml`
    pub root: PathBuf,
    /// Parsed manifest
    pub manifest: PluginManifest,
}

/// Recursively walk `root` and collect plugin directories.
///
/// A directory is a plugin root iff it directly contains `plugin.toml`.
/// Recursion stops descending once a plugin root is found at that level;
/// sibling trees are still explored. Produces a fresh list on every call,
/// in sorted traversal order. Unreadable directories and malformed
/// manifests are logged and skipped, never fatal.
pub fn discover(root: &Path) -> Vec<DiscoveredPlugin> {
    let mut found = Vec::new();
    if !root.is_dir() {
        tracing::debug!(dir = %root.display(), "plugin root does not exist");
        return found;
    }
    walk(root, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<DiscoveredPlugin>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    for child in children {
        let manifest_path = child.join(PLUGIN_MANIFEST);
        if !manifest_path.is_file() {
            // Not a plugin root; keep descending
            walk(&child, found);
            continue;
        }

        let manifest = PluginManifest::load(&manifest_path)
            .map_err(|e| PluginHostError::ConfigInvalid(e.to_string()));
        match manifest {
            Ok(manifest) => found.push(DiscoveredPlugin {
                root: child,
                manifest,
            }),
            Err(e) => {
                tracing::warn!(
                    dir = %child.display(),
                    error = %e,
                    "skipping plugin with malformed manifest"
                );
            }
        }
    }
}

/// In-memory index of discovered manifests, keyed by manifest `name`.
///
/// Built once per discovery pass and queried during dependency-closure
/// computation, so no manifest is re-read from disk. On duplicate names
/// the first discovered manifest wins; the duplicate is rejected later at
/// load time.
pub struct ManifestIndex {
    by_name: HashMap<String, PluginManifest>,
}

impl ManifestIndex {
    /// Build an index from a discovery pass
    pub fn new(discovered: &[DiscoveredPlugin]) -> Self {
        let mut by_name = HashMap::new();
        for plugin in discovered {
            by_name
                .entry(plugin.manifest.name.clone())
                .or_insert_with(|| plugin.manifest.clone());
        }
        Self { by_name }
    }

    /// Look up a discovered manifest by name
    pub fn get(&self, name: &str) -> Option<&PluginManifest> {
        self.by_name.get(name)
    }

    /// Validate the transitive dependency closure of `manifest`.
    ///
    /// Walks `dependencies` recursively, pulling in each dependency's own
    /// dependencies; a name already seen is not re-expanded, so dependency
    /// cycles terminate. Fails on the first name that is absent from the
    /// index or whose discovered version is below the required minimum.
    pub fn validate_closure(&self, manifest: &PluginManifest) -> Result<(), PluginHostError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = manifest
            .dependencies
            .iter()
            .map(|(name, min)| (name.clone(), *min))
            .collect();

        while let Some((name, required)) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }

            let found = self
                .get(&name)
                .ok_or(PluginHostError::MissingDependency {
                    dependency: name.clone(),
                })?;

            if found.version < required {
                return Err(PluginHostError::OutdatedDependency {
                    dependency: name,
                    found: found.version,
                    required,
                });
            }

            for (dep, min) in &found.dependencies {
                if !seen.contains(dep) {
                    queue.push_back((dep.clone(), *min));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_plugin(root: &Path, rel: &str, manifest: &str) {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PLUGIN_MANIFEST), manifest).unwrap();
    }

    fn manifest_toml(name: &str, version: u32, deps: &[(&str, u32)]) -> String {
        let mut text = format!(
            "name = \"{name}\"\nvisual-name = \"{name}\"\nversion = {version}\nloader-version = \"1.0\"\n"
        );
        if !deps.is_empty() {
            text.push_str("\n[dependencies]\n");
            for (dep, min) in deps {
                text.push_str(&format!("{dep} = {min}\n"));
            }
        }
        text
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let found = discover(Path::new("/nonexistent/plugins"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_finds_direct_children() {
        let dir = TempDir::new().unwrap();
        write_plugin(dir.path(), "alpha", &manifest_toml("alpha", 1, &[]));
        write_plugin(dir.path(), "beta", &manifest_toml("beta", 1, &[]));

        let found = discover(dir.path());
        let names: Vec<_> = found.iter().map(|p| p.manifest.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_discover_descends_into_non_plugin_dirs() {
        let dir = TempDir::new().unwrap();
        // Mirrors a tree like plugins/bundle/extra/gamma/plugin.toml
        write_plugin(
            dir.path(),
            "bundle/extra/gamma",
            &manifest_toml("gamma", 1, &[]),
        );

        let found = discover(dir.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].manifest.name, "gamma");
        assert!(found[0].root.ends_with("bundle/extra/gamma"));
    }

    #[test]
    fn test_discover_stops_descending_at_plugin_root() {
        let dir = TempDir::new().unwrap();
        write_plugin(dir.path(), "outer", &manifest_toml("outer", 1, &[]));
        // Nested under a plugin root; must not be discovered
        write_plugin(
            dir.path(),
            "outer/nested-inner",
            &manifest_toml("inner", 1, &[]),
        );

        let found = discover(dir.path());
        let names: Vec<_> = found.iter().map(|p| p.manifest.name.as_str()).collect();
        assert_eq!(names, vec!["outer"]);
    }

    #[test]
    fn test_discover_skips_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        write_plugin(dir.path(), "good", &manifest_toml("good", 1, &[]));
        write_plugin(dir.path(), "bad", "not = valid = toml");

        let found = discover(dir.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].manifest.name, "good");
    }

    #[test]
    fn test_index_first_manifest_wins_on_duplicate() {
        let dir = TempDir::new().unwrap();
        write_plugin(dir.path(), "a-first", &manifest_toml("twin", 1, &[]));
        write_plugin(dir.path(), "b-second", &manifest_toml("twin", 9, &[]));

        let found = discover(dir.path());
        let index = ManifestIndex::new(&found);
        assert_eq!(index.get("twin").unwrap().version, 1);
    }

    #[test]
    fn test_closure_ok_when_all_present_and_current() {
        let plugins = [
            manifest_toml("a", 2, &[]),
            manifest_toml("b", 1, &[("a", 2)]),
            manifest_toml("c", 1, &[("b", 1)]),
        ];
        let discovered: Vec<_> = plugins
            .iter()
            .map(|text| DiscoveredPlugin {
                root: PathBuf::from("/x"),
                manifest: PluginManifest::from_toml(text).unwrap(),
            })
            .collect();
        let index = ManifestIndex::new(&discovered);

        let c = index.get("c").unwrap().clone();
        assert!(index.validate_closure(&c).is_ok());
    }

    #[test]
    fn test_closure_rejects_missing_transitive_dependency() {
        let plugins = [
            manifest_toml("b", 1, &[("ghost", 1)]),
            manifest_toml("c", 1, &[("b", 1)]),
        ];
        let discovered: Vec<_> = plugins
            .iter()
            .map(|text| DiscoveredPlugin {
                root: PathBuf::from("/x"),
                manifest: PluginManifest::from_toml(text).unwrap(),
            })
            .collect();
        let index = ManifestIndex::new(&discovered);

        let c = index.get("c").unwrap().clone();
        let err = index.validate_closure(&c).unwrap_err();
        assert!(matches!(
            err,
            PluginHostError::MissingDependency { dependency } if dependency == "ghost"
        ));
    }

    #[test]
    fn test_closure_rejects_outdated_dependency() {
        let plugins = [manifest_toml("a", 1, &[]), manifest_toml("b", 1, &[("a", 2)])];
        let discovered: Vec<_> = plugins
            .iter()
            .map(|text| DiscoveredPlugin {
                root: PathBuf::from("/x"),
                manifest: PluginManifest::from_toml(text).unwrap(),
            })
            .collect();
        let index = ManifestIndex::new(&discovered);

        let b = index.get("b").unwrap().clone();
        let err = index.validate_closure(&b).unwrap_err();
        assert!(matches!(
            err,
            PluginHostError::OutdatedDependency { found: 1, required: 2, .. }
        ));
    }

    #[test]
    fn test_closure_tolerates_dependency_cycles() {
        let plugins = [
            manifest_toml("a", 1, &[("b", 1)]),
            manifest_toml("b", 1, &[("a", 1)]),
        ];
        let discovered: Vec<_> = plugins
            .iter()
            .map(|text| DiscoveredPlugin {
                root: PathBuf::from("/x"),
                manifest: PluginManifest::from_toml(text).unwrap(),
            })
            .collect();
        let index = ManifestIndex::new(&discovered);

        let a = index.get("a").unwrap().clone();
        // Must terminate: a name already in the closure is not re-expanded
        assert!(index.validate_closure(&a).is_ok());
    }
}
