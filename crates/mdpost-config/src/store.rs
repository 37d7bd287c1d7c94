//! Shared plugin configuration store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::ConfigError;
use crate::settings::Settings;
use crate::value::{ConfigMap, ENABLED_KEY, PluginConfig};

/// Host persistence callback invoked after every write.
///
/// Failures are logged by the store and never reach the caller.
pub trait SettingsSink: Send + Sync {
    fn persist(&self, settings: &Settings) -> Result<(), ConfigError>;
}

impl<F> SettingsSink for F
where
    F: Fn(&Settings) -> Result<(), ConfigError> + Send + Sync,
{
    fn persist(&self, settings: &Settings) -> Result<(), ConfigError> {
        self(settings)
    }
}

/// Persists settings as a pretty-printed JSON file.
///
/// A file that does not load as settings is copied to `<path>.bak` before
/// the first overwrite.
#[derive(Debug, Clone)]
pub struct FileSettingsSink {
    path: PathBuf,
}

impl FileSettingsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }
}

impl SettingsSink for FileSettingsSink {
    fn persist(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if let Ok(existing) = std::fs::read_to_string(&self.path)
            && !Settings::is_loadable(&existing)
        {
            let backup = self.backup_path();
            std::fs::write(&backup, existing)?;
            tracing::warn!(
                path = %self.path.display(),
                backup = %backup.display(),
                "overwriting unreadable settings file, previous content kept as backup"
            );
        }
        std::fs::write(&self.path, settings.to_json()?)?;
        Ok(())
    }
}

/// Per-plugin configuration with copy-on-write snapshots.
///
/// Readers take [`snapshot`](Self::snapshot), an immutable view that stays
/// valid for a whole render. Writers swap in a modified copy, so a write made
/// during a render is visible to the next render only. The sink runs under
/// the write lock, so persisted states follow write order.
pub struct ConfigStore {
    state: RwLock<Arc<Settings>>,
    sink: Option<Box<dyn SettingsSink>>,
}

impl ConfigStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            state: RwLock::new(Arc::new(settings)),
            sink: None,
        }
    }

    /// Load from a persisted blob. Malformed input yields defaults.
    #[must_use]
    pub fn from_json(json: &str) -> Self {
        Self::new(Settings::from_json(json))
    }

    /// Load from a settings file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(Self::from_json(&json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "settings file not found, using defaults");
                Ok(Self::new(Settings::default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Attach a persistence callback.
    #[must_use]
    pub fn with_sink(mut self, sink: impl SettingsSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Immutable view of the current settings.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Config of `plugin`, defaulting to `{enabled: true}`.
    #[must_use]
    pub fn get(&self, plugin: &str) -> PluginConfig {
        self.snapshot().plugin_config(plugin)
    }

    #[must_use]
    pub fn is_enabled(&self, plugin: &str) -> bool {
        self.snapshot().is_enabled(plugin)
    }

    /// Shallow-merge `partial` into the plugin's config, persist, and return
    /// the merged result.
    pub fn set(&self, plugin: &str, partial: &ConfigMap) -> PluginConfig {
        let merged = self.write(true, |settings| {
            let config = settings.plugins_config.entry(plugin.to_owned()).or_default();
            config.merge(partial);
            config.clone()
        });
        tracing::debug!(plugin, keys = partial.len(), "plugin config updated");
        merged
    }

    /// Toggle a plugin. Shorthand for `set(plugin, {enabled})`.
    pub fn set_enabled(&self, plugin: &str, enabled: bool) -> PluginConfig {
        let partial = ConfigMap::from([(ENABLED_KEY.to_owned(), enabled.into())]);
        self.set(plugin, &partial)
    }

    /// Fill keys missing from the plugin's config with `defaults`.
    ///
    /// Stored values win. Nothing is persisted: defaults are not user choices.
    pub fn seed_defaults(&self, plugin: &str, defaults: &ConfigMap) {
        self.write(false, |settings| {
            settings
                .plugins_config
                .entry(plugin.to_owned())
                .or_default()
                .fill_defaults(defaults)
        });
    }

    /// Update global render fields (theme, template, colors) and persist.
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        self.write(true, update);
    }

    fn write<T>(&self, persist: bool, update: impl FnOnce(&mut Settings) -> T) -> T {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let result = update(Arc::make_mut(&mut guard));
        if persist {
            self.persist(&guard);
        }
        result
    }

    fn persist(&self, settings: &Settings) {
        if let Some(sink) = &self.sink
            && let Err(e) = sink.persist(settings)
        {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("settings", &self.snapshot())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::value::ConfigValue;
    use pretty_assertions::assert_eq;

    fn partial(entries: &[(&str, ConfigValue)]) -> ConfigMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn test_get_unconfigured_returns_enabled_default() {
        let store = ConfigStore::default();
        assert_eq!(store.get("heading"), PluginConfig::default());
        assert!(store.is_enabled("heading"));
    }

    #[test]
    fn test_set_merges_shallowly() {
        let store = ConfigStore::default();
        store.set("p", &partial(&[("a", 1_i64.into())]));
        let merged = store.set("p", &partial(&[("b", 2_i64.into())]));

        let json = serde_json::to_value(&merged).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1, "b": 2, "enabled": true}));
        assert_eq!(store.get("p"), merged);
    }

    #[test]
    fn test_set_enabled() {
        let store = ConfigStore::default();
        store.set("p", &partial(&[("a", 1_i64.into())]));
        let config = store.set_enabled("p", false);

        assert!(!config.enabled);
        assert_eq!(config.get("a"), Some(&ConfigValue::from(1_i64)));
        assert!(!store.is_enabled("p"));
    }

    #[test]
    fn test_every_set_persists() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let store = ConfigStore::default().with_sink(move |settings: &Settings| -> Result<(), ConfigError> {
            recorded
                .lock()
                .unwrap()
                .push(settings.plugin_config("p").enabled);
            Ok(())
        });

        store.set_enabled("p", false);
        store.set_enabled("p", true);

        assert_eq!(*calls.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn test_persist_failure_does_not_propagate() {
        let store = ConfigStore::default().with_sink(|_: &Settings| -> Result<(), ConfigError> {
            Err(ConfigError::Validation("disk full".to_owned()))
        });

        let config = store.set("p", &partial(&[("a", true.into())]));
        assert!(config.bool_or("a", false));
        assert!(store.get("p").bool_or("a", false));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = ConfigStore::default();
        let before = store.snapshot();
        store.set_enabled("p", false);

        assert!(before.is_enabled("p"));
        assert!(!store.snapshot().is_enabled("p"));
    }

    #[test]
    fn test_seed_defaults_does_not_overwrite_or_persist() {
        let calls = Arc::new(Mutex::new(0_usize));
        let counter = Arc::clone(&calls);
        let store = ConfigStore::from_json(r#"{"pluginsConfig": {"p": {"style": "dark"}}}"#)
            .with_sink(move |_: &Settings| -> Result<(), ConfigError> {
                *counter.lock().unwrap() += 1;
                Ok(())
            });

        store.seed_defaults("p", &partial(&[("style", "light".into()), ("n", 3_i64.into())]));

        let config = store.get("p");
        assert_eq!(config.str_or("style", ""), "dark");
        assert_eq!(config.get("n"), Some(&ConfigValue::from(3_i64)));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_update_settings_persists_globals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let store = ConfigStore::default().with_sink(FileSettingsSink::new(&path));

        store.update_settings(|settings| settings.theme = "ocean".to_owned());

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.snapshot().theme, "ocean");
    }

    #[test]
    fn test_concurrent_sets_persist_in_write_order() {
        let persisted = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&persisted);
        let store = ConfigStore::default().with_sink(move |settings: &Settings| -> Result<(), ConfigError> {
            let n = settings
                .plugin_config("p")
                .get("n")
                .cloned()
                .unwrap_or(ConfigValue::from(-1_i64));
            recorded.lock().unwrap().push(n);
            Ok(())
        });

        std::thread::scope(|scope| {
            for i in 0..8_i64 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.set("p", &partial(&[("n", i.into())]));
                    }
                });
            }
        });

        let persisted = persisted.lock().unwrap();
        assert_eq!(persisted.len(), 160);
        assert_eq!(persisted.last(), store.get("p").get("n"));
    }

    #[test]
    fn test_unreadable_file_backed_up_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{").unwrap();

        let sink = FileSettingsSink::new(&path);
        let backup = sink.backup_path();
        let store = ConfigStore::load(&path).unwrap().with_sink(sink);
        store.set_enabled("p", false);

        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{{{");
        assert!(!ConfigStore::load(&path).unwrap().is_enabled("p"));

        store.set_enabled("p", true);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{{{");
    }

    #[test]
    fn test_readable_file_not_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "default"}"#).unwrap();

        let sink = FileSettingsSink::new(&path);
        let backup = sink.backup_path();
        let store = ConfigStore::load(&path).unwrap().with_sink(sink);
        store.set_enabled("p", false);

        assert!(!backup.exists());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(*store.snapshot(), Settings::default());
    }

    #[test]
    fn test_load_malformed_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{").unwrap();

        let store = ConfigStore::load(&path).unwrap();
        assert_eq!(*store.snapshot(), Settings::default());
    }
}
