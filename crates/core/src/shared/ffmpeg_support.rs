//! Conversions between this crate's media types and ffmpeg-next's.

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::{Pixel, Sample};
use ffmpeg_next::{ffi, ChannelLayout};

use crate::audio::domain::format_descriptor::{AudioFormatDescriptor, SampleFormat, SampleLayout};
use crate::shared::error::BackendError;
use crate::shared::media_time::Rational;
use crate::video::domain::video_frame::FramePixelFormat;

impl From<ffmpeg_next::Error> for BackendError {
    fn from(e: ffmpeg_next::Error) -> Self {
        BackendError(e.to_string())
    }
}

pub fn to_ffmpeg_rational(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}

pub fn from_ffmpeg_rational(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

pub fn pixel_format(format: FramePixelFormat) -> Pixel {
    match format {
        FramePixelFormat::Nv12 => Pixel::NV12,
        FramePixelFormat::Yuv420p => Pixel::YUV420P,
    }
}

pub fn sample_format(format: &AudioFormatDescriptor) -> Sample {
    let layout = match format.layout {
        SampleLayout::Interleaved => SampleType::Packed,
        SampleLayout::Planar => SampleType::Planar,
    };
    match format.sample_format {
        SampleFormat::U8 => Sample::U8(layout),
        SampleFormat::S16 => Sample::I16(layout),
        SampleFormat::S32 => Sample::I32(layout),
        SampleFormat::F32 => Sample::F32(layout),
        SampleFormat::F64 => Sample::F64(layout),
    }
}

pub fn sample_format_from_ffmpeg(sample: Sample) -> Option<(SampleFormat, SampleLayout)> {
    let (format, kind) = match sample {
        Sample::U8(t) => (SampleFormat::U8, t),
        Sample::I16(t) => (SampleFormat::S16, t),
        Sample::I32(t) => (SampleFormat::S32, t),
        Sample::F32(t) => (SampleFormat::F32, t),
        Sample::F64(t) => (SampleFormat::F64, t),
        _ => return None,
    };
    let layout = match kind {
        SampleType::Packed => SampleLayout::Interleaved,
        SampleType::Planar => SampleLayout::Planar,
    };
    Some((format, layout))
}

/// Only mono and stereo capture is supported.
pub fn channel_layout(channels: u16) -> Result<ChannelLayout, BackendError> {
    match channels {
        1 => Ok(ChannelLayout::MONO),
        2 => Ok(ChannelLayout::STEREO),
        n => Err(BackendError::new(format!(
            "unsupported channel layout: {n} channels"
        ))),
    }
}

/// `EAGAIN` from `receive_packet`: the encoder needs more input.
pub fn is_again(e: &ffmpeg_next::Error) -> bool {
    matches!(
        e,
        ffmpeg_next::Error::Other { errno }
            if *errno == ffi::EAGAIN || *errno == ffi::AVERROR(ffi::EAGAIN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::planar_f32(AudioFormatDescriptor::planar(48000, 2, SampleFormat::F32), Sample::F32(SampleType::Planar))]
    #[case::packed_s16(AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16), Sample::I16(SampleType::Packed))]
    fn test_sample_format_mapping(#[case] format: AudioFormatDescriptor, #[case] expected: Sample) {
        assert_eq!(sample_format(&format), expected);
        assert_eq!(
            sample_format_from_ffmpeg(expected),
            Some((format.sample_format, format.layout))
        );
    }

    #[test]
    fn test_channel_layout_rejects_surround() {
        assert!(channel_layout(1).is_ok());
        assert!(channel_layout(2).is_ok());
        assert!(channel_layout(6).is_err());
    }

    #[test]
    fn test_rational_round_trip() {
        let r = Rational::new(1, 44100);
        assert_eq!(from_ffmpeg_rational(to_ffmpeg_rational(r)), r);
    }

    #[test]
    fn test_eof_is_not_again() {
        assert!(!is_again(&ffmpeg_next::Error::Eof));
    }
}
