//! Session discovery.
//!
//! Recordings are named `recording_<epoch-millis>_<client>.mkv`. The latest
//! session is the one with the largest timestamp; its `host_audio` file is the
//! reference audio and every other client is a camera.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::session::SessionSources;

/// Client id of the reference audio recording.
pub const HOST_AUDIO_CLIENT: &str = "host_audio";

const RECORDING_PREFIX: &str = "recording_";
const RECORDING_EXTENSION: &str = "mkv";

/// Supplies the camera and audio files for one assembly run.
pub trait SessionProvider: Send + Sync {
    fn latest_session(&self) -> MishranResult<SessionSources>;
}

/// An already-resolved session.
#[derive(Debug, Clone)]
pub struct FixedSession(pub SessionSources);

impl SessionProvider for FixedSession {
    fn latest_session(&self) -> MishranResult<SessionSources> {
        Ok(self.0.clone())
    }
}

/// Finds the latest session in a recordings directory.
#[derive(Debug, Clone)]
pub struct RecordingsDirProvider {
    dir: PathBuf,
}

/// A recording file name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingName {
    pub timestamp: u64,
    pub client_id: String,
}

impl RecordingName {
    /// Parse `recording_<digits>_<client>.mkv`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(RECORDING_EXTENSION)?
            .strip_suffix('.')?
            .strip_prefix(RECORDING_PREFIX)?;
        let (timestamp, client_id) = stem.split_once('_')?;
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            timestamp: timestamp.parse().ok()?,
            client_id: client_id.to_string(),
        })
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.timestamp).ok()?)
    }
}

impl RecordingsDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn recordings(&self) -> MishranResult<Vec<(PathBuf, RecordingName)>> {
        if !self.dir.is_dir() {
            return Err(MishranError::missing_input(format!(
                "recordings directory {} does not exist",
                self.dir.display()
            )));
        }

        let mut found = vec![];
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(parsed) = RecordingName::parse(name) {
                found.push((path.clone(), parsed));
            }
        }
        Ok(found)
    }
}

impl SessionProvider for RecordingsDirProvider {
    fn latest_session(&self) -> MishranResult<SessionSources> {
        let recordings = self.recordings()?;
        let latest = recordings
            .iter()
            .map(|(_, name)| name.timestamp)
            .max()
            .ok_or_else(|| {
                MishranError::missing_input(format!(
                    "no recording_*.mkv files in {}",
                    self.dir.display()
                ))
            })?;

        let mut cameras = vec![];
        let mut reference_audio = None;
        let mut recorded_at = None;
        for (path, name) in recordings {
            if name.timestamp != latest {
                continue;
            }
            recorded_at = recorded_at.or_else(|| name.recorded_at());
            if name.client_id == HOST_AUDIO_CLIENT {
                reference_audio.get_or_insert(path);
            } else {
                cameras.push(path);
            }
        }
        cameras.sort();

        if cameras.is_empty() {
            return Err(MishranError::missing_input(format!(
                "session {latest} has no camera recordings"
            )));
        }
        let reference_audio = reference_audio.ok_or_else(|| {
            MishranError::missing_input(format!("session {latest} has no {HOST_AUDIO_CLIENT} recording"))
        })?;

        tracing::info!(
            session_id = latest,
            recorded_at = ?recorded_at,
            cameras = cameras.len(),
            audio = %reference_audio.display(),
            "Detected session"
        );

        Ok(SessionSources {
            session_id: latest.to_string(),
            cameras,
            reference_audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_parse_recording_name() {
        assert_eq!(
            RecordingName::parse("recording_1700000000000_host_audio.mkv"),
            Some(RecordingName {
                timestamp: 1_700_000_000_000,
                client_id: "host_audio".into()
            })
        );
        assert_eq!(
            RecordingName::parse("recording_17_abc.mkv").map(|n| n.client_id),
            Some("abc".into())
        );
        assert!(RecordingName::parse("recording_x1_abc.mkv").is_none());
        assert!(RecordingName::parse("recording_17_abc.mp4").is_none());
        assert!(RecordingName::parse("other_17_abc.mkv").is_none());
    }

    #[test]
    fn test_latest_session_wins() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "recording_900_guest.mkv",
            "recording_900_host_audio.mkv",
            "recording_1000_zed.mkv",
            "recording_1000_alpha.mkv",
            "recording_1000_host_audio.mkv",
            "notes.txt",
        ] {
            touch(dir.path(), name);
        }

        let session = RecordingsDirProvider::new(dir.path())
            .latest_session()
            .unwrap();

        assert_eq!(session.session_id, "1000");
        assert_eq!(
            session.cameras,
            vec![
                dir.path().join("recording_1000_alpha.mkv"),
                dir.path().join("recording_1000_zed.mkv"),
            ]
        );
        assert_eq!(
            session.reference_audio,
            dir.path().join("recording_1000_host_audio.mkv")
        );
    }

    #[test]
    fn test_missing_host_audio_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "recording_5_cam.mkv");
        touch(dir.path(), "recording_4_host_audio.mkv");

        let err = RecordingsDirProvider::new(dir.path())
            .latest_session()
            .unwrap_err();
        assert!(matches!(err, MishranError::MissingInput { .. }));
    }

    #[test]
    fn test_empty_or_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let provider = RecordingsDirProvider::new(dir.path());
        assert!(provider.latest_session().unwrap_err().is_setup_failure());

        let provider = RecordingsDirProvider::new(dir.path().join("absent"));
        assert!(provider.latest_session().unwrap_err().is_setup_failure());
    }
}
