use crate::audio::domain::audio_converter::AudioConverterFactory;
use crate::audio::infrastructure::swr_audio_converter::SwrAudioConverterFactory;
use crate::codec::domain::codec_catalog::CodecCatalog;
use crate::codec::infrastructure::ffmpeg_codec_catalog::FfmpegCodecCatalog;
use crate::container::domain::container_sink::ContainerFactory;
use crate::container::infrastructure::ffmpeg_container::FfmpegContainerFactory;
use crate::encoding::domain::encoder_factory::EncoderFactory;
use crate::encoding::infrastructure::ffmpeg_encoder_factory::FfmpegEncoderFactory;
use crate::shared::error::BackendError;

/// The capabilities a [`ScreenRecordWriter`](super::screen_record_writer::ScreenRecordWriter)
/// is built from.
pub struct WriterBackend {
    pub codecs: Box<dyn CodecCatalog>,
    pub encoders: Box<dyn EncoderFactory>,
    pub converters: Box<dyn AudioConverterFactory>,
    pub containers: Box<dyn ContainerFactory>,
}

impl WriterBackend {
    /// FFmpeg for everything, container format taken from the file extension.
    pub fn ffmpeg() -> Result<Self, BackendError> {
        Self::ffmpeg_with(FfmpegContainerFactory::new())
    }

    /// FFmpeg for everything, writing `format_name` (e.g. `matroska`)
    /// whatever the file is called.
    pub fn ffmpeg_with_format(format_name: &str) -> Result<Self, BackendError> {
        Self::ffmpeg_with(FfmpegContainerFactory::with_format(format_name))
    }

    fn ffmpeg_with(containers: FfmpegContainerFactory) -> Result<Self, BackendError> {
        ffmpeg_next::init()?;
        Ok(Self {
            codecs: Box::new(FfmpegCodecCatalog::new()),
            encoders: Box::new(FfmpegEncoderFactory::new()),
            converters: Box::new(SwrAudioConverterFactory::new()),
            containers: Box::new(containers),
        })
    }
}
