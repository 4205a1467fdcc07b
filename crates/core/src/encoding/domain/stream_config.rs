use crate::shared::constants::OUTPUT_AUDIO_CHANNELS;
use crate::shared::error::{Result, WriterError};
use crate::shared::media_time::Rational;

/// Encoder settings for a video stream, validated from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoStreamConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bit_rate: u64,
}

impl VideoStreamConfig {
    /// Width and height must be positive and even (4:2:0 chroma is
    /// subsampled in both directions); frame rate and bit rate positive.
    pub fn from_raw(width: i32, height: i32, frame_rate: i32, bit_rate: i64) -> Result<Self> {
        let width = positive("width", width as i64)?;
        let height = positive("height", height as i64)?;
        let frame_rate = positive("frame rate", frame_rate as i64)?;
        let bit_rate = positive("bit rate", bit_rate)?;
        if width % 2 != 0 || height % 2 != 0 {
            return Err(WriterError::InvalidParameters(format!(
                "video size {width}x{height} must be even"
            )));
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            frame_rate: frame_rate as u32,
            bit_rate,
        })
    }

    /// One tick per frame.
    pub fn time_base(&self) -> Rational {
        Rational::new(1, self.frame_rate as i32)
    }
}

/// Encoder settings for an audio stream. Output is always stereo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStreamConfig {
    pub sample_rate: u32,
    pub bit_rate: u64,
    pub channels: u16,
}

impl AudioStreamConfig {
    pub fn from_raw(sample_rate: i32, bit_rate: i64) -> Result<Self> {
        let sample_rate = positive("sample rate", sample_rate as i64)?;
        let bit_rate = positive("bit rate", bit_rate)?;
        Ok(Self {
            sample_rate: sample_rate as u32,
            bit_rate,
            channels: OUTPUT_AUDIO_CHANNELS,
        })
    }

    /// One tick per sample.
    pub fn time_base(&self) -> Rational {
        Rational::new(1, self.sample_rate as i32)
    }
}

/// Container-imposed encoder options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Codec headers go into stream extradata instead of every keyframe.
    pub global_header: bool,
}

fn positive(name: &str, value: i64) -> Result<u64> {
    if value <= 0 {
        return Err(WriterError::InvalidParameters(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_video_config() {
        let config = VideoStreamConfig::from_raw(1280, 720, 30, 4_000_000).unwrap();
        assert_eq!(config.width, 1280);
        assert_eq!(config.time_base(), Rational::new(1, 30));
    }

    #[rstest]
    #[case::zero_width(0, 720, 30, 1)]
    #[case::negative_height(1280, -720, 30, 1)]
    #[case::zero_frame_rate(1280, 720, 0, 1)]
    #[case::zero_bit_rate(1280, 720, 30, 0)]
    #[case::odd_width(1281, 720, 30, 1)]
    #[case::odd_height(1280, 719, 30, 1)]
    fn test_invalid_video_config(
        #[case] width: i32,
        #[case] height: i32,
        #[case] frame_rate: i32,
        #[case] bit_rate: i64,
    ) {
        assert!(matches!(
            VideoStreamConfig::from_raw(width, height, frame_rate, bit_rate),
            Err(WriterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_audio_config_is_stereo() {
        let config = AudioStreamConfig::from_raw(48000, 128_000).unwrap();
        assert_eq!(config.channels, 2);
        assert_eq!(config.time_base(), Rational::new(1, 48000));
    }

    #[rstest]
    #[case::zero_rate(0, 128_000)]
    #[case::negative_bit_rate(48000, -1)]
    fn test_invalid_audio_config(#[case] sample_rate: i32, #[case] bit_rate: i64) {
        assert!(AudioStreamConfig::from_raw(sample_rate, bit_rate).is_err());
    }
}
