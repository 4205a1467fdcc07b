use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::stream_parameters::StreamParameters;
use crate::shared::error::BackendError;
use crate::shared::media_time::Rational;
use crate::video::domain::video_frame::{FramePixelFormat, VideoFrame};

/// Behaviour shared by every opened encoder.
pub trait Encoder: Send {
    fn time_base(&self) -> Rational;

    fn parameters(&self) -> StreamParameters;

    /// Signal end of input; buffered packets become receivable.
    fn send_eof(&mut self) -> Result<(), BackendError>;

    /// Move the next ready packet into `packet`.
    ///
    /// Returns `Ok(false)` when the encoder needs more input (or is drained
    /// after end of input).
    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<bool, BackendError>;
}

pub trait VideoEncoder: Encoder {
    /// Layout the encoder expects its frames in.
    fn pixel_format(&self) -> FramePixelFormat;

    /// Submit one frame stamped `pts` in [`Encoder::time_base`] ticks.
    fn send_frame(&mut self, frame: &VideoFrame, pts: i64) -> Result<(), BackendError>;
}

pub trait AudioEncoder: Encoder {
    /// Samples per frame; every frame but the last must be exactly this long.
    fn frame_size(&self) -> usize;

    /// PCM format `send_frame` expects.
    fn input_format(&self) -> AudioFormatDescriptor;

    fn send_frame(&mut self, samples: &SampleBuffer, pts: i64) -> Result<(), BackendError>;
}
