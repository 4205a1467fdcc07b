use std::path::Path;

use ffmpeg_next::ffi;
use ffmpeg_next::format::context::Output;

use crate::codec::domain::codec_handle::CodecHandle;
use crate::container::domain::container_sink::{ContainerFactory, ContainerSink};
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::stream_parameters::{MediaParameters, StreamParameters};
use crate::shared::error::BackendError;
use crate::shared::ffmpeg_support::{pixel_format, to_ffmpeg_rational};

/// Opens libavformat outputs. The format comes from the file extension
/// unless one is forced by name.
#[derive(Debug, Default, Clone)]
pub struct FfmpegContainerFactory {
    format_name: Option<String>,
}

impl FfmpegContainerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format_name: impl Into<String>) -> Self {
        Self {
            format_name: Some(format_name.into()),
        }
    }
}

impl ContainerFactory for FfmpegContainerFactory {
    fn create(&self, path: &Path) -> Result<Box<dyn ContainerSink>, BackendError> {
        let output = match self.format_name.as_deref() {
            Some(name) => ffmpeg_next::format::output_as(path, name)?,
            None => ffmpeg_next::format::output(path)?,
        };
        Ok(Box::new(FfmpegContainer {
            output,
            time_bases: Vec::new(),
            header_written: false,
        }))
    }
}

/// A libavformat output context.
pub struct FfmpegContainer {
    output: Output,
    /// Container time base per stream, as chosen by the muxer at header time.
    time_bases: Vec<ffmpeg_next::Rational>,
    header_written: bool,
}

// Safety: the output context is owned by one muxer and only used from
// whichever thread currently holds the writer.
unsafe impl Send for FfmpegContainer {}

impl ContainerSink for FfmpegContainer {
    fn requires_global_header(&self) -> bool {
        self.output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER)
    }

    fn add_stream(&mut self, codec: &CodecHandle) -> Result<usize, BackendError> {
        let ff_codec = ffmpeg_next::encoder::find_by_name(codec.name())
            .ok_or_else(|| BackendError::new(format!("encoder {} is not available", codec.name())))?;
        let stream = self.output.add_stream(ff_codec)?;
        Ok(stream.index())
    }

    fn configure_stream(
        &mut self,
        index: usize,
        parameters: &StreamParameters,
    ) -> Result<(), BackendError> {
        let codec_id = ffmpeg_next::encoder::find_by_name(&parameters.codec_name)
            .map(|codec| codec.id())
            .ok_or_else(|| {
                BackendError::new(format!("encoder {} is not available", parameters.codec_name))
            })?;

        let mut stream = self
            .output
            .stream_mut(index)
            .ok_or_else(|| BackendError::new(format!("no container stream {index}")))?;
        let params = stream.parameters();
        set_stream_parameters(&params, codec_id, parameters);
        stream.set_time_base(to_ffmpeg_rational(parameters.time_base));
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), BackendError> {
        self.output.write_header()?;
        self.time_bases = self.output.streams().map(|s| s.time_base()).collect();
        self.header_written = true;
        Ok(())
    }

    fn write_packet(&mut self, index: usize, packet: &EncodedPacket) -> Result<(), BackendError> {
        if !self.header_written {
            return Err(BackendError::new("header not written"));
        }
        let stream_time_base = *self
            .time_bases
            .get(index)
            .ok_or_else(|| BackendError::new(format!("no container stream {index}")))?;

        let mut ff_packet = ffmpeg_next::Packet::copy(&packet.data);
        ff_packet.set_stream(index);
        ff_packet.set_pts(packet.pts);
        ff_packet.set_dts(packet.dts);
        ff_packet.set_duration(packet.duration);
        if packet.is_keyframe {
            ff_packet.set_flags(ffmpeg_next::packet::Flags::KEY);
        }
        ff_packet.rescale_ts(to_ffmpeg_rational(packet.time_base), stream_time_base);
        ff_packet.write_interleaved(&mut self.output)?;
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), BackendError> {
        self.output.write_trailer()?;
        Ok(())
    }
}

fn set_stream_parameters(
    params: &ffmpeg_next::codec::Parameters,
    codec_id: ffmpeg_next::codec::Id,
    parameters: &StreamParameters,
) {
    unsafe {
        let ptr = params.as_ptr() as *mut ffi::AVCodecParameters;
        (*ptr).codec_id = codec_id.into();
        (*ptr).bit_rate = parameters.bit_rate as i64;

        match parameters.media {
            MediaParameters::Video {
                width,
                height,
                pixel_format: format,
                ..
            } => {
                (*ptr).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
                (*ptr).width = width as i32;
                (*ptr).height = height as i32;
                (*ptr).format = ffi::AVPixelFormat::from(pixel_format(format)) as i32;
            }
            MediaParameters::Audio {
                sample_rate,
                channels,
                frame_size,
            } => {
                (*ptr).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_AUDIO;
                (*ptr).sample_rate = sample_rate as i32;
                (*ptr).frame_size = frame_size as i32;
                ffi::av_channel_layout_uninit(&mut (*ptr).ch_layout);
                ffi::av_channel_layout_default(&mut (*ptr).ch_layout, channels as i32);
            }
        }

        // Padding is required by libavcodec readers of extradata.
        if !parameters.extradata.is_empty() {
            let len = parameters.extradata.len();
            let buf = ffi::av_mallocz(len + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize) as *mut u8;
            if !buf.is_null() {
                if !(*ptr).extradata.is_null() {
                    ffi::av_free((*ptr).extradata as *mut std::ffi::c_void);
                }
                std::ptr::copy_nonoverlapping(parameters.extradata.as_ptr(), buf, len);
                (*ptr).extradata = buf;
                (*ptr).extradata_size = len as i32;
            }
        }
    }
}
