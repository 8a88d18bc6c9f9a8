//! On-disk session storage.
//!
//! Two files live in an owner-only data directory:
//!
//! - `session.json` - the durable mirror: tokens and profile of an
//!   authenticated session, restored across restarts.
//! - `challenge.json` - the transient mirror: an in-progress two-factor
//!   challenge, so a restart mid-verification can resume. Cleared the
//!   moment verification succeeds or the challenge is abandoned.
//!
//! Writes go through a temp-file-and-rename so a crash can never leave a
//! half-written file, and both files are created owner-read/write only.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use backdesk_types::OtpChallenge;

use crate::session::PersistedSession;

const SESSION_FILE: &str = "session.json";
const CHALLENGE_FILE: &str = "challenge.json";

/// Resolve the data directory: explicit override, `$BACKDESK_DATA_DIR`,
/// then the platform data dir.
pub fn data_dir(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("BACKDESK_DATA_DIR") {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("backdesk")
}

/// Create `path` if needed and tighten it to owner-only on Unix.
pub fn ensure_secure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(path)?;

        // Only modify permissions if we own the directory
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }

        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!("data dir permissions are too open ({mode:o}); tightening to 0700");
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

/// Temp file + rename, owner-only permissions.
fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Best-effort directory sync so the rename survives a crash.
    if let Err(e) = File::open(parent).and_then(|d| d.sync_all()) {
        tracing::debug!(path = %parent.display(), "parent dir sync failed: {e}");
    }
    Ok(())
}

/// Handle to the session files inside the data directory.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    dir: PathBuf,
}

impl SessionStorage {
    /// Open (and secure) the storage directory.
    pub fn open(dir: PathBuf) -> io::Result<Self> {
        ensure_secure_dir(&dir)?;
        Ok(Self { dir })
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn challenge_path(&self) -> PathBuf {
        self.dir.join(CHALLENGE_FILE)
    }

    pub fn save_session(&self, session: &PersistedSession) -> anyhow::Result<()> {
        write_json(&self.session_path(), session)
    }

    /// Load the durable session, if one was saved. Corrupt files are
    /// discarded (with a log line) rather than wedging startup.
    pub fn load_session(&self) -> Option<PersistedSession> {
        read_json(&self.session_path())
    }

    pub fn clear_session(&self) {
        remove_if_exists(&self.session_path());
    }

    pub fn save_challenge(&self, challenge: &OtpChallenge) -> anyhow::Result<()> {
        write_json(&self.challenge_path(), challenge)
    }

    pub fn load_challenge(&self) -> Option<OtpChallenge> {
        read_json(&self.challenge_path())
    }

    pub fn clear_challenge(&self) {
        remove_if_exists(&self.challenge_path());
    }

    /// Clear both mirrors; used on logout and on session teardown.
    pub fn clear_all(&self) {
        self.clear_session();
        self.clear_challenge();
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &bytes)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to read session file: {e}");
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), "discarding corrupt session file: {e}");
            remove_if_exists(path);
            None
        }
    }
}

fn remove_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove session file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdesk_types::{AuthTokens, ChallengeId, DeliveryChannel, Profile};
    use chrono::Utc;

    fn storage() -> (tempfile::TempDir, SessionStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = SessionStorage::open(dir.path().join("backdesk")).expect("open");
        (dir, storage)
    }

    fn session() -> PersistedSession {
        PersistedSession {
            tokens: AuthTokens {
                token: "jwt-abc".to_owned(),
                token_type: Some("Bearer".to_owned()),
                expires_at: None,
                expires_in: Some(3600),
            },
            profile: Profile {
                email: Some("ops@example.com".to_owned()),
                ..Default::default()
            },
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn session_round_trips() {
        let (_dir, storage) = storage();
        assert!(storage.load_session().is_none());

        storage.save_session(&session()).expect("save");
        let loaded = storage.load_session().expect("load");
        assert_eq!(loaded.tokens.token, "jwt-abc");

        storage.clear_session();
        assert!(storage.load_session().is_none());
    }

    #[test]
    fn challenge_is_independent_of_session() {
        let (_dir, storage) = storage();
        let challenge = OtpChallenge {
            challenge_id: ChallengeId::from("ch-1"),
            email: "ops@example.com".to_owned(),
            phone: None,
            delivery_channel: DeliveryChannel::Email,
            expires_at: Utc::now(),
        };

        storage.save_challenge(&challenge).expect("save");
        storage.save_session(&session()).expect("save");

        storage.clear_challenge();
        assert!(storage.load_challenge().is_none());
        assert!(storage.load_session().is_some());
    }

    #[test]
    fn corrupt_files_are_discarded() {
        let (_dir, storage) = storage();
        fs::write(storage.session_path(), b"{not json").expect("write garbage");
        assert!(storage.load_session().is_none());
        // The corrupt file must be gone so the next save starts clean.
        assert!(!storage.session_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn files_and_dir_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, storage) = storage();
        storage.save_session(&session()).expect("save");

        let dir_mode = fs::metadata(&storage.dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);

        let file_mode = fs::metadata(storage.session_path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);
    }
}
