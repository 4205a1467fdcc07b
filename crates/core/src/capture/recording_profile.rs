use crate::encoding::domain::stream_config::AudioStreamConfig;
use crate::shared::constants::{DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC};
use crate::shared::error::{Result, WriterError};

pub const VIDEO_SLOT: usize = 0;
pub const SCREEN_AUDIO_SLOT: usize = 1;
pub const MIC_AUDIO_SLOT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProfile {
    pub sample_rate: u32,
    pub bit_rate: u64,
}

/// Encoder settings for one recording: a video stream sized from the first
/// captured frame, screen audio, and optionally the microphone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingProfile {
    pub video_codec: String,
    pub audio_codec: String,
    pub frame_rate: u32,
    pub video_bit_rate: u64,
    pub screen_audio: AudioProfile,
    /// `None` records without a microphone stream.
    pub microphone: Option<AudioProfile>,
}

impl Default for RecordingProfile {
    fn default() -> Self {
        Self {
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            frame_rate: 120,
            video_bit_rate: 8_000_000,
            screen_audio: AudioProfile {
                sample_rate: 44100,
                bit_rate: 320_000,
            },
            microphone: Some(AudioProfile {
                sample_rate: 48000,
                bit_rate: 320_000,
            }),
        }
    }
}

impl RecordingProfile {
    /// Check every rate before any stream is created, so a bad profile fails
    /// at construction instead of on the first captured frame.
    pub fn validate(&self) -> Result<()> {
        if self.video_codec.is_empty() || self.audio_codec.is_empty() {
            return Err(WriterError::InvalidParameters(
                "codec names must not be empty".to_string(),
            ));
        }
        let frame_rate = to_i32("frame rate", self.frame_rate as u64)?;
        let video_bit_rate = to_i64("video bit rate", self.video_bit_rate)?;
        if frame_rate <= 0 || video_bit_rate <= 0 {
            return Err(WriterError::InvalidParameters(format!(
                "video needs a positive frame rate and bit rate, got {} fps at {} bps",
                self.frame_rate, self.video_bit_rate
            )));
        }
        self.screen_audio.stream_config()?;
        if let Some(mic) = &self.microphone {
            mic.stream_config()?;
        }
        Ok(())
    }

    /// Slots the session fills, in the order they are opened.
    pub fn slots(&self) -> Vec<usize> {
        let mut slots = vec![VIDEO_SLOT, SCREEN_AUDIO_SLOT];
        if self.microphone.is_some() {
            slots.push(MIC_AUDIO_SLOT);
        }
        slots
    }
}

impl AudioProfile {
    pub fn stream_config(&self) -> Result<AudioStreamConfig> {
        AudioStreamConfig::from_raw(
            to_i32("sample rate", self.sample_rate as u64)?,
            to_i64("audio bit rate", self.bit_rate)?,
        )
    }
}

fn to_i32(name: &str, value: u64) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| WriterError::InvalidParameters(format!("{name} {value} is too large")))
}

fn to_i64(name: &str, value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| WriterError::InvalidParameters(format!("{name} {value} is too large")))
}
