use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// A resolved encoder. Immutable once the catalog hands it out.
///
/// `name` is the backend's own encoder name, which may differ from the
/// name that was asked for (e.g. `"h264"` resolving to `"libx264"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecHandle {
    name: String,
    kind: MediaKind,
}

impl CodecHandle {
    pub fn new(name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}
