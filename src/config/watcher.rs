//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors and
//! deploy tools often replace the file by renaming a new one over it, which
//! would silently end a watch on the old inode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Reloads the configuration file whenever it changes and publishes every
/// config that loads and validates.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of the update channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Events stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
            notify::Error::generic("config path has no file name").add_path(self.path.clone())
        })?;

        let path = self.path;
        let tx = self.update_tx;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => reload(&path, &tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = %dir.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// True if `event` may have changed the content behind `file_name`.
fn touches(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<GatewayConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), endpoints = config.endpoints.len(), "Config file changed");
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Config reload failed, keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
    use std::fs;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_changes_to_the_config_file_count() {
        let name = OsString::from("gateway.toml");

        let renamed_over = event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), "/etc/gw/gateway.toml");
        assert!(touches(&renamed_over, &name));
        assert!(touches(&event(EventKind::Create(CreateKind::File), "/etc/gw/gateway.toml"), &name));

        assert!(!touches(&event(EventKind::Create(CreateKind::File), "/etc/gw/.gateway.toml.swp"), &name));
        assert!(!touches(&event(EventKind::Remove(RemoveKind::File), "/etc/gw/gateway.toml"), &name));
    }

    #[tokio::test]
    async fn reloads_after_file_is_replaced_by_rename() {
        let dir = std::env::temp_dir().join(format!("sse-gateway-watch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(&path, "").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        let staged = dir.join("gateway.toml.new");
        fs::write(&staged, "[[endpoints]]\nendpoint = \"/events\"\n").unwrap();
        fs::rename(&staged, &path).unwrap();

        let config = loop {
            let next = tokio::time::timeout(Duration::from_secs(5), updates.recv())
                .await
                .expect("no reload after rename")
                .unwrap();
            if !next.endpoints.is_empty() {
                break next;
            }
        };
        assert_eq!(config.endpoints[0].endpoint, "/events");

        let _ = fs::remove_dir_all(&dir);
    }
}
