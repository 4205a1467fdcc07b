use ffmpeg_next::format::Pixel;

use crate::codec::domain::codec_handle::CodecHandle;
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::{Encoder, VideoEncoder};
use crate::encoding::domain::stream_config::{EncoderOptions, VideoStreamConfig};
use crate::encoding::domain::stream_parameters::{MediaParameters, StreamParameters};
use crate::encoding::infrastructure::packet_receiver::{extradata, make_writable, receive_into};
use crate::shared::error::BackendError;
use crate::shared::ffmpeg_support::{pixel_format, to_ffmpeg_rational};
use crate::shared::media_time::Rational;
use crate::video::domain::plane_copy::copy_plane;
use crate::video::domain::video_frame::{FramePixelFormat, VideoFrame};

/// Video encoder backed by libavcodec.
///
/// Frames go in as NV12 when the codec takes it (hardware encoders
/// usually do) and as planar YUV 4:2:0 otherwise. One keyframe per second,
/// no B-frames, so packets come out in presentation order.
pub struct FfmpegVideoEncoder {
    encoder: ffmpeg_next::encoder::video::Encoder,
    frame: ffmpeg_next::util::frame::video::Video,
    packet: ffmpeg_next::Packet,
    codec_name: String,
    config: VideoStreamConfig,
    format: FramePixelFormat,
}

// Safety: the encoder is owned by a single stream and only driven from
// whichever thread currently holds the writer.
unsafe impl Send for FfmpegVideoEncoder {}

impl FfmpegVideoEncoder {
    pub fn open(
        codec: &CodecHandle,
        config: &VideoStreamConfig,
        options: EncoderOptions,
    ) -> Result<Self, BackendError> {
        let ff_codec = ffmpeg_next::encoder::find_by_name(codec.name()).ok_or_else(|| {
            BackendError::new(format!("encoder {} is not available", codec.name()))
        })?;
        let format = preferred_pixel_format(ff_codec);

        let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(ff_codec)
            .encoder()
            .video()?;
        ctx.set_width(config.width);
        ctx.set_height(config.height);
        ctx.set_format(pixel_format(format));
        ctx.set_time_base(to_ffmpeg_rational(config.time_base()));
        ctx.set_frame_rate(Some(ffmpeg_next::Rational::new(config.frame_rate as i32, 1)));
        ctx.set_bit_rate(config.bit_rate as usize);
        ctx.set_gop(config.frame_rate);
        ctx.set_max_b_frames(0);
        if options.global_header {
            ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = ctx.open_with(ffmpeg_next::Dictionary::new())?;
        let frame = ffmpeg_next::util::frame::video::Video::new(
            pixel_format(format),
            config.width,
            config.height,
        );

        log::debug!(
            "Opened video encoder {} at {}x{} {} fps ({:?})",
            codec.name(),
            config.width,
            config.height,
            config.frame_rate,
            format
        );

        Ok(Self {
            encoder,
            frame,
            packet: ffmpeg_next::Packet::empty(),
            codec_name: codec.name().to_string(),
            config: *config,
            format,
        })
    }
}

impl Encoder for FfmpegVideoEncoder {
    fn time_base(&self) -> Rational {
        self.config.time_base()
    }

    fn parameters(&self) -> StreamParameters {
        StreamParameters {
            codec_name: self.codec_name.clone(),
            time_base: self.config.time_base(),
            bit_rate: self.config.bit_rate,
            extradata: extradata(&self.encoder),
            media: MediaParameters::Video {
                width: self.config.width,
                height: self.config.height,
                pixel_format: self.format,
                frame_rate: Rational::new(self.config.frame_rate as i32, 1),
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

impl VideoEncoder for FfmpegVideoEncoder {
    fn pixel_format(&self) -> FramePixelFormat {
        self.format
    }

    fn send_frame(&mut self, frame: &VideoFrame, pts: i64) -> Result<(), BackendError> {
        if frame.format() != self.format {
            return Err(BackendError::new(format!(
                "frame is {:?}, encoder expects {:?}",
                frame.format(),
                self.format
            )));
        }

        make_writable(&mut self.frame)?;
        for plane in 0..frame.plane_count().min(self.frame.planes()) {
            let dst_stride = self.frame.stride(plane);
            copy_plane(
                frame.plane(plane),
                frame.stride(plane),
                self.frame.data_mut(plane),
                dst_stride,
                frame.stride(plane),
                frame.plane_height(plane),
            );
        }
        self.frame.set_pts(Some(pts));
        self.encoder.send_frame(&self.frame)?;
        Ok(())
    }
}

fn preferred_pixel_format(codec: ffmpeg_next::Codec) -> FramePixelFormat {
    let takes_nv12 = codec
        .video()
        .ok()
        .and_then(|video| video.formats())
        .map(|mut formats| formats.any(|f| f == Pixel::NV12))
        .unwrap_or(false);
    if takes_nv12 {
        FramePixelFormat::Nv12
    } else {
        FramePixelFormat::Yuv420p
    }
}
