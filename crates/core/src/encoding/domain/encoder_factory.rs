use crate::codec::domain::codec_handle::CodecHandle;
use crate::encoding::domain::encoder::{AudioEncoder, VideoEncoder};
use crate::encoding::domain::stream_config::{AudioStreamConfig, EncoderOptions, VideoStreamConfig};
use crate::shared::error::BackendError;

/// Opens encoders for resolved codecs, keeping stream setup independent of
/// the codec library.
pub trait EncoderFactory: Send {
    fn open_video(
        &self,
        codec: &CodecHandle,
        config: &VideoStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn VideoEncoder>, BackendError>;

    fn open_audio(
        &self,
        codec: &CodecHandle,
        config: &AudioStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn AudioEncoder>, BackendError>;
}
