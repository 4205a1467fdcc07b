use crate::shared::media_time::Rational;
use crate::video::domain::video_frame::FramePixelFormat;

/// Media-specific half of [`StreamParameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaParameters {
    Video {
        width: u32,
        height: u32,
        pixel_format: FramePixelFormat,
        frame_rate: Rational,
    },
    Audio {
        sample_rate: u32,
        channels: u16,
        frame_size: usize,
    },
}

/// What an opened encoder tells the container about its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParameters {
    /// Backend encoder name, as carried by the stream's codec handle.
    pub codec_name: String,
    pub time_base: Rational,
    pub bit_rate: u64,
    /// Out-of-band codec configuration (SPS/PPS, AudioSpecificConfig).
    pub extradata: Vec<u8>,
    pub media: MediaParameters,
}
