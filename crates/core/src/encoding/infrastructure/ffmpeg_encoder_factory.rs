use crate::codec::domain::codec_handle::CodecHandle;
use crate::encoding::domain::encoder::{AudioEncoder, VideoEncoder};
use crate::encoding::domain::encoder_factory::EncoderFactory;
use crate::encoding::domain::stream_config::{AudioStreamConfig, EncoderOptions, VideoStreamConfig};
use crate::encoding::infrastructure::ffmpeg_audio_encoder::FfmpegAudioEncoder;
use crate::encoding::infrastructure::ffmpeg_video_encoder::FfmpegVideoEncoder;
use crate::shared::error::BackendError;

#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegEncoderFactory;

impl FfmpegEncoderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn open_video(
        &self,
        codec: &CodecHandle,
        config: &VideoStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn VideoEncoder>, BackendError> {
        Ok(Box::new(FfmpegVideoEncoder::open(codec, config, options)?))
    }

    fn open_audio(
        &self,
        codec: &CodecHandle,
        config: &AudioStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn AudioEncoder>, BackendError> {
        Ok(Box::new(FfmpegAudioEncoder::open(codec, config, options)?))
    }
}
