use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Known keys: `api.origin`, `http.timeout` (seconds), `color`.
#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map
            .insert("api.origin".to_string(), DEFAULT_ORIGIN.to_string());
        cfg.map.insert(
            "http.timeout".to_string(),
            DEFAULT_TIMEOUT_SECS.to_string(),
        );
        cfg.map.insert("color".to_string(), "on".to_string());

        let rc_path = resolve_rc_path(rc_override)?;
        if let Some(path) = rc_path {
            info!(rc = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    pub fn api_origin(&self) -> String {
        self.get("api.origin")
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
    }

    pub fn http_timeout(&self) -> Duration {
        let secs = self
            .get("http.timeout")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        self.loaded_files.push(path.clone());

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }
            if line.is_empty() {
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(override_path))]
fn resolve_rc_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var("TODORC") {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let candidate = home.join(".todorc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    warn!("no .todorc in home directory");
    Ok(None)
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Config;

    #[test]
    fn defaults_without_rc_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join("todorc");
        std::fs::write(&rc, "").expect("write");

        let cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.api_origin(), "http://127.0.0.1:8000/api");
        assert_eq!(cfg.http_timeout().as_secs(), 30);
        assert_eq!(cfg.get_bool("color"), Some(true));
    }

    #[test]
    fn rc_file_and_overrides_win_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join("todorc");
        let mut file = std::fs::File::create(&rc).expect("create");
        writeln!(file, "# local backend").expect("write");
        writeln!(file, "api.origin = http://localhost:9000/api  # dev").expect("write");
        writeln!(file, "color = off").expect("write");

        let mut cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.api_origin(), "http://localhost:9000/api");
        assert_eq!(cfg.get_bool("color"), Some(false));

        cfg.apply_overrides([("rc.api.origin".to_string(), "http://x/api".to_string())]);
        assert_eq!(cfg.api_origin(), "http://x/api");
    }

    #[test]
    fn invalid_line_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join("todorc");
        std::fs::write(&rc, "just some words\n").expect("write");

        assert!(Config::load(Some(&rc)).is_err());
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join("todorc");
        std::fs::write(&rc, "http.timeout = soon\n").expect("write");

        let cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.http_timeout().as_secs(), 30);
    }
}
