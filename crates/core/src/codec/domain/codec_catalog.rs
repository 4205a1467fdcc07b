use crate::codec::domain::codec_handle::{CodecHandle, MediaKind};

/// Looks up encoders by name so codec resolution does not depend on a
/// specific codec library.
pub trait CodecCatalog: Send {
    /// Returns `None` when no encoder of `kind` answers to `name`.
    fn find_encoder(&self, name: &str, kind: MediaKind) -> Option<CodecHandle>;
}
