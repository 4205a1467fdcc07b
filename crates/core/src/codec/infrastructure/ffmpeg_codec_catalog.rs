use crate::codec::domain::codec_catalog::CodecCatalog;
use crate::codec::domain::codec_handle::{CodecHandle, MediaKind};

/// Resolves encoders from the linked FFmpeg build.
///
/// Exact encoder names (`libx264`, `h264_videotoolbox`, `aac_at`) are tried
/// first; generic codec names fall back to FFmpeg's default encoder for that
/// codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegCodecCatalog;

impl FfmpegCodecCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl CodecCatalog for FfmpegCodecCatalog {
    fn find_encoder(&self, name: &str, kind: MediaKind) -> Option<CodecHandle> {
        let codec = ffmpeg_next::encoder::find_by_name(name)
            .or_else(|| generic_codec_id(name).and_then(ffmpeg_next::encoder::find))?;

        let expected = match kind {
            MediaKind::Video => ffmpeg_next::media::Type::Video,
            MediaKind::Audio => ffmpeg_next::media::Type::Audio,
        };
        if codec.medium() != expected {
            return None;
        }

        Some(CodecHandle::new(codec.name(), kind))
    }
}

fn generic_codec_id(name: &str) -> Option<ffmpeg_next::codec::Id> {
    use ffmpeg_next::codec::Id;

    match name.to_ascii_lowercase().as_str() {
        "h264" | "avc" => Some(Id::H264),
        "h265" | "hevc" => Some(Id::HEVC),
        "mpeg4" => Some(Id::MPEG4),
        "aac" => Some(Id::AAC),
        "opus" => Some(Id::OPUS),
        "mp3" => Some(Id::MP3),
        _ => None,
    }
}
