/// Upper bound on the number of streams a single output file can carry.
pub const MAX_STREAMS: usize = 8;

/// Samples per audio frame when the encoder accepts any frame size.
pub const DEFAULT_AUDIO_FRAME_SIZE: usize = 1024;

/// Audio encoders are always fed stereo, whatever the capture layout.
pub const OUTPUT_AUDIO_CHANNELS: u16 = 2;

/// Frames of input a converter pulls per round trip through the supplier.
pub const CONVERTER_PULL_FRAMES: usize = 1024;

pub const DEFAULT_VIDEO_CODEC: &str = "h264_videotoolbox";
pub const DEFAULT_AUDIO_CODEC: &str = "aac_at";
