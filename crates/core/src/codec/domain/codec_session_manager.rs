use std::collections::HashMap;

use crate::codec::domain::codec_catalog::CodecCatalog;
use crate::codec::domain::codec_handle::{CodecHandle, MediaKind};
use crate::shared::error::{Result, WriterError};

/// Owns the video and audio codec selections for one writer.
///
/// Lookups are cached per `(kind, name)`, so resolving the same name twice
/// hits the catalog once. A failed lookup leaves the current selection as
/// it was.
pub struct CodecSessionManager {
    catalog: Box<dyn CodecCatalog>,
    resolved: HashMap<(MediaKind, String), CodecHandle>,
    video: Option<CodecHandle>,
    audio: Option<CodecHandle>,
}

impl CodecSessionManager {
    pub fn new(catalog: Box<dyn CodecCatalog>) -> Self {
        Self {
            catalog,
            resolved: HashMap::new(),
            video: None,
            audio: None,
        }
    }

    pub fn resolve_video_codec(&mut self, name: &str) -> Result<&CodecHandle> {
        let handle = self.resolve(name, MediaKind::Video)?;
        Ok(&*self.video.insert(handle))
    }

    pub fn resolve_audio_codec(&mut self, name: &str) -> Result<&CodecHandle> {
        let handle = self.resolve(name, MediaKind::Audio)?;
        Ok(&*self.audio.insert(handle))
    }

    pub fn video_codec(&self) -> Result<&CodecHandle> {
        self.video.as_ref().ok_or(WriterError::CodecUnavailable {
            kind: MediaKind::Video,
        })
    }

    pub fn audio_codec(&self) -> Result<&CodecHandle> {
        self.audio.as_ref().ok_or(WriterError::CodecUnavailable {
            kind: MediaKind::Audio,
        })
    }

    fn resolve(&mut self, name: &str, kind: MediaKind) -> Result<CodecHandle> {
        let key = (kind, name.to_string());
        if let Some(handle) = self.resolved.get(&key) {
            return Ok(handle.clone());
        }

        let handle =
            self.catalog
                .find_encoder(name, kind)
                .ok_or_else(|| WriterError::CodecNotFound {
                    name: name.to_string(),
                })?;
        log::debug!("Resolved {kind} codec {name:?} to {:?}", handle.name());
        self.resolved.insert(key, handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // ─── Stubs ───

    struct StubCatalog {
        lookups: Arc<AtomicUsize>,
    }

    impl CodecCatalog for StubCatalog {
        fn find_encoder(&self, name: &str, kind: MediaKind) -> Option<CodecHandle> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match (name, kind) {
                ("h264", MediaKind::Video) => Some(CodecHandle::new("libx264", kind)),
                ("mpeg4", MediaKind::Video) => Some(CodecHandle::new("mpeg4", kind)),
                ("aac", MediaKind::Audio) => Some(CodecHandle::new("aac", kind)),
                _ => None,
            }
        }
    }

    fn manager() -> (CodecSessionManager, Arc<AtomicUsize>) {
        let lookups = Arc::new(AtomicUsize::new(0));
        let catalog = StubCatalog {
            lookups: lookups.clone(),
        };
        (CodecSessionManager::new(Box::new(catalog)), lookups)
    }

    #[test]
    fn test_resolve_video_codec_selects_handle() {
        let (mut m, _) = manager();
        let handle = m.resolve_video_codec("h264").unwrap();
        assert_eq!(handle.name(), "libx264");
        assert_eq!(m.video_codec().unwrap().kind(), MediaKind::Video);
    }

    #[test]
    fn test_unknown_name_fails_with_codec_not_found() {
        let (mut m, _) = manager();
        let err = m.resolve_audio_codec("nope").unwrap_err();
        assert!(matches!(err, WriterError::CodecNotFound { name } if name == "nope"));
    }

    #[test]
    fn test_wrong_kind_is_not_found() {
        let (mut m, _) = manager();
        assert!(m.resolve_video_codec("aac").is_err());
    }

    #[test]
    fn test_unresolved_codec_is_unavailable() {
        let (m, _) = manager();
        assert!(matches!(
            m.audio_codec(),
            Err(WriterError::CodecUnavailable {
                kind: MediaKind::Audio
            })
        ));
    }

    #[test]
    fn test_repeated_resolution_hits_catalog_once() {
        let (mut m, lookups) = manager();
        m.resolve_video_codec("h264").unwrap();
        m.resolve_video_codec("h264").unwrap();
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_resolution_keeps_previous_selection() {
        let (mut m, _) = manager();
        m.resolve_video_codec("mpeg4").unwrap();
        assert!(m.resolve_video_codec("bogus").is_err());
        assert_eq!(m.video_codec().unwrap().name(), "mpeg4");
    }

    #[test]
    fn test_reselection_replaces_handle() {
        let (mut m, _) = manager();
        m.resolve_video_codec("mpeg4").unwrap();
        m.resolve_video_codec("h264").unwrap();
        assert_eq!(m.video_codec().unwrap().name(), "libx264");
    }
}
