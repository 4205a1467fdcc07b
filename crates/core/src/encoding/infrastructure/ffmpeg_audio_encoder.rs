use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;

use crate::audio::domain::format_descriptor::{AudioFormatDescriptor, SampleFormat, SampleLayout};
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::codec::domain::codec_handle::CodecHandle;
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::{AudioEncoder, Encoder};
use crate::encoding::domain::stream_config::{AudioStreamConfig, EncoderOptions};
use crate::encoding::domain::stream_parameters::{MediaParameters, StreamParameters};
use crate::encoding::infrastructure::packet_receiver::{extradata, make_writable, receive_into};
use crate::shared::constants::DEFAULT_AUDIO_FRAME_SIZE;
use crate::shared::error::BackendError;
use crate::shared::ffmpeg_support::{
    channel_layout, sample_format, sample_format_from_ffmpeg, to_ffmpeg_rational,
};
use crate::shared::media_time::Rational;

/// Audio encoder backed by libavcodec.
pub struct FfmpegAudioEncoder {
    encoder: ffmpeg_next::encoder::audio::Encoder,
    frame: ffmpeg_next::util::frame::audio::Audio,
    packet: ffmpeg_next::Packet,
    codec_name: String,
    config: AudioStreamConfig,
    input_format: AudioFormatDescriptor,
    frame_size: usize,
}

// Safety: see FfmpegVideoEncoder.
unsafe impl Send for FfmpegAudioEncoder {}

impl FfmpegAudioEncoder {
    pub fn open(
        codec: &CodecHandle,
        config: &AudioStreamConfig,
        options: EncoderOptions,
    ) -> Result<Self, BackendError> {
        let ff_codec = ffmpeg_next::encoder::find_by_name(codec.name()).ok_or_else(|| {
            BackendError::new(format!("encoder {} is not available", codec.name()))
        })?;
        let input_format = preferred_input_format(ff_codec, config)?;
        let layout = channel_layout(config.channels)?;

        let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(ff_codec)
            .encoder()
            .audio()?;
        ctx.set_rate(config.sample_rate as i32);
        ctx.set_channel_layout(layout);
        ctx.set_format(sample_format(&input_format));
        ctx.set_time_base(to_ffmpeg_rational(config.time_base()));
        ctx.set_bit_rate(config.bit_rate as usize);
        if options.global_header {
            ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = ctx.open_with(ffmpeg_next::Dictionary::new())?;
        let frame_size = match encoder.frame_size() {
            0 => DEFAULT_AUDIO_FRAME_SIZE,
            n => n as usize,
        };

        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            sample_format(&input_format),
            frame_size,
            layout,
        );
        frame.set_rate(config.sample_rate);

        log::debug!(
            "Opened audio encoder {} at {} Hz, {} samples per frame ({})",
            codec.name(),
            config.sample_rate,
            frame_size,
            input_format
        );

        Ok(Self {
            encoder,
            frame,
            packet: ffmpeg_next::Packet::empty(),
            codec_name: codec.name().to_string(),
            config: *config,
            input_format,
            frame_size,
        })
    }
}

impl Encoder for FfmpegAudioEncoder {
    fn time_base(&self) -> Rational {
        self.config.time_base()
    }

    fn parameters(&self) -> StreamParameters {
        StreamParameters {
            codec_name: self.codec_name.clone(),
            time_base: self.config.time_base(),
            bit_rate: self.config.bit_rate,
            extradata: extradata(&self.encoder),
            media: MediaParameters::Audio {
                sample_rate: self.config.sample_rate,
                channels: self.config.channels,
                frame_size: self.frame_size,
            },
        }
    }

    fn send_eof(&mut self) -> Result<(), BackendError> {
        self.encoder.send_eof()?;
        Ok(())
    }

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<bool, BackendError> {
        let time_base = self.config.time_base();
        receive_into(&mut self.encoder, &mut self.packet, time_base, packet)
    }
}

impl AudioEncoder for FfmpegAudioEncoder {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn input_format(&self) -> AudioFormatDescriptor {
        self.input_format
    }

    fn send_frame(&mut self, samples: &SampleBuffer, pts: i64) -> Result<(), BackendError> {
        if *samples.format() != self.input_format {
            return Err(BackendError::new(format!(
                "samples are {}, encoder expects {}",
                samples.format(),
                self.input_format
            )));
        }
        let count = samples.frames();
        if count == 0 || count > self.frame_size {
            return Err(BackendError::new(format!(
                "audio frame holds {count} samples, encoder takes at most {}",
                self.frame_size
            )));
        }

        // Buffers were sized for a full frame; restore that before asking
        // libavutil to reallocate them.
        self.frame.set_samples(self.frame_size);
        make_writable(&mut self.frame)?;
        self.frame.set_samples(count);

        let bytes = count * self.input_format.bytes_per_frame();
        for plane in 0..samples.plane_count() {
            self.frame.data_mut(plane)[..bytes].copy_from_slice(&samples.plane(plane)[..bytes]);
        }
        self.frame.set_pts(Some(pts));
        self.encoder.send_frame(&self.frame)?;
        Ok(())
    }
}

/// Planar float when the codec takes it, else the first format we can
/// represent.
fn preferred_input_format(
    codec: ffmpeg_next::Codec,
    config: &AudioStreamConfig,
) -> Result<AudioFormatDescriptor, BackendError> {
    let supported: Vec<Sample> = codec
        .audio()
        .ok()
        .and_then(|audio| audio.formats())
        .map(|formats| formats.collect())
        .unwrap_or_default();

    let preferred = Sample::F32(SampleType::Planar);
    let (format, layout) = if supported.is_empty() || supported.contains(&preferred) {
        (SampleFormat::F32, SampleLayout::Planar)
    } else {
        supported
            .iter()
            .find_map(|s| sample_format_from_ffmpeg(*s))
            .ok_or_else(|| {
                BackendError::new(format!("{} takes no usable sample format", codec.name()))
            })?
    };

    let descriptor = match layout {
        SampleLayout::Planar => {
            AudioFormatDescriptor::planar(config.sample_rate, config.channels, format)
        }
        SampleLayout::Interleaved => {
            AudioFormatDescriptor::interleaved(config.sample_rate, config.channels, format)
        }
    };
    Ok(descriptor)
}
