use crate::audio::domain::format_converter::FormatConverter;
use crate::audio::domain::input_queue::InputQueue;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::codec::domain::codec_handle::{CodecHandle, MediaKind};
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::{AudioEncoder, VideoEncoder};
use crate::encoding::domain::stream_config::{AudioStreamConfig, VideoStreamConfig};
use crate::shared::slot::Slot;
use crate::stream::stream_phase::StreamPhase;
use crate::video::domain::video_frame::VideoFrame;

/// Counters for one stream, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames handed to the encoder.
    pub frames_submitted: u64,
    pub packets_written: u64,
    pub bytes_written: u64,
    /// Last packet pts, in the encoder time base.
    pub last_packet_pts: Option<i64>,
}

pub struct VideoStream {
    pub config: VideoStreamConfig,
    pub encoder: Option<Box<dyn VideoEncoder>>,
    /// Reusable picture in the encoder's layout, overwritten by every write.
    pub frame: Option<VideoFrame>,
}

pub struct AudioStream {
    pub config: AudioStreamConfig,
    pub encoder: Option<Box<dyn AudioEncoder>>,
    /// Encoder frame being filled; a partial frame carries over between writes.
    pub frame: Option<SampleBuffer>,
    /// Conversion into the encoder's input format. Its output side is fixed
    /// when the encoder opens.
    pub converter: Option<FormatConverter>,
    /// Input waiting to be pulled, in the converter's current input format.
    pub queue: Option<InputQueue>,
    /// Lowest pts the next encoder frame may carry.
    pub next_pts: i64,
}

pub enum StreamMedia {
    Video(VideoStream),
    Audio(AudioStream),
}

/// Everything the writer keeps for one occupied slot.
pub struct StreamState {
    pub slot: Slot,
    pub phase: StreamPhase,
    pub codec: CodecHandle,
    /// Index of this stream inside the container.
    pub stream_index: usize,
    pub media: StreamMedia,
    /// Reusable packet the encoder overwrites for every packet it emits.
    pub packet: EncodedPacket,
    /// Set after an encode or conversion failure; the stream accepts no
    /// further samples.
    pub faulted: bool,
    pub stats: StreamStats,
}

impl StreamState {
    pub fn video(slot: Slot, codec: CodecHandle, stream_index: usize, config: VideoStreamConfig) -> Self {
        Self::new(
            slot,
            codec,
            stream_index,
            StreamMedia::Video(VideoStream {
                config,
                encoder: None,
                frame: None,
            }),
        )
    }

    pub fn audio(slot: Slot, codec: CodecHandle, stream_index: usize, config: AudioStreamConfig) -> Self {
        Self::new(
            slot,
            codec,
            stream_index,
            StreamMedia::Audio(AudioStream {
                config,
                encoder: None,
                frame: None,
                converter: None,
                queue: None,
                next_pts: 0,
            }),
        )
    }

    fn new(slot: Slot, codec: CodecHandle, stream_index: usize, media: StreamMedia) -> Self {
        Self {
            slot,
            phase: StreamPhase::Configured,
            codec,
            stream_index,
            media,
            packet: EncodedPacket::new(),
            faulted: false,
            stats: StreamStats::default(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self.media {
            StreamMedia::Video(_) => MediaKind::Video,
            StreamMedia::Audio(_) => MediaKind::Audio,
        }
    }

    /// Drop the encoder, converter and scratch buffers.
    pub fn release(&mut self) {
        match &mut self.media {
            StreamMedia::Video(video) => {
                video.encoder = None;
                video.frame = None;
            }
            StreamMedia::Audio(audio) => {
                audio.encoder = None;
                audio.frame = None;
                audio.converter = None;
                audio.queue = None;
            }
        }
        self.packet = EncodedPacket::new();
    }
}
