use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::model::User;

/// The signed-in session: the bearer token plus the user profile the
/// server returned with it. Persisted so the CLI stays logged in between
/// invocations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Owns the on-disk session state. Exactly one store is created at
/// startup and handed to the gateway; logout and authorization failures
/// clear it through the same object.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open() -> Self {
        SessionStore {
            dir: config_dir(),
        }
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: PathBuf) -> Self {
        SessionStore { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    pub fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(self.path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save(&self, session: &Session) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(self.path(), json)
    }

    pub fn clear(&self) {
        // Nothing to do if there was no session file in the first place.
        fs::remove_file(self.path()).ok();
    }
}

/// Platform config directory holding `settings.toml` and `session.json`.
pub fn config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "tecnigestion", "app") {
        return proj_dirs.config_dir().to_path_buf();
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    fn scratch_store(tag: &str) -> SessionStore {
        let dir = std::env::temp_dir().join(format!(
            "tecnigestion-session-{}-{}",
            tag,
            std::process::id()
        ));
        fs::remove_dir_all(&dir).ok();
        SessionStore::at(dir)
    }

    fn sample_session() -> Session {
        Session {
            token: "abc123".to_string(),
            user: User {
                id: 1,
                name: "Ana".to_string(),
                surname: Some("García".to_string()),
                email: "ana@taller.es".to_string(),
                phone: Some("600000000".to_string()),
                company: None,
            },
        }
    }

    #[test]
    fn load_without_saved_session_is_none() {
        let store = scratch_store("empty");
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = scratch_store("roundtrip");
        store.save(&sample_session()).unwrap();

        let loaded = store.load().expect("session should load back");
        assert_eq!(loaded.token, "abc123");
        assert_eq!(loaded.user.email, "ana@taller.es");

        store.clear();
    }

    #[test]
    fn clear_removes_saved_session() {
        let store = scratch_store("clear");
        store.save(&sample_session()).unwrap();
        assert!(store.load().is_some());

        store.clear();
        assert!(store.load().is_none());

        // Clearing twice must not fail.
        store.clear();
    }
}
