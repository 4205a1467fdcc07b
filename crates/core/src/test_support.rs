//! In-memory capabilities for unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::domain::audio_converter::{AudioConverter, AudioConverterFactory, InputSupplier};
use crate::audio::domain::format_descriptor::{AudioFormatDescriptor, SampleFormat};
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::codec::domain::codec_catalog::CodecCatalog;
use crate::codec::domain::codec_handle::{CodecHandle, MediaKind};
use crate::container::domain::container_sink::{ContainerFactory, ContainerSink};
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::{AudioEncoder, Encoder, VideoEncoder};
use crate::encoding::domain::encoder_factory::EncoderFactory;
use crate::encoding::domain::stream_config::{AudioStreamConfig, EncoderOptions, VideoStreamConfig};
use crate::encoding::domain::stream_parameters::{MediaParameters, StreamParameters};
use crate::shared::error::BackendError;
use crate::shared::media_time::Rational;
use crate::video::domain::video_frame::{FramePixelFormat, VideoFrame};
use crate::writer::writer_backend::WriterBackend;

// ─── Codecs ───

/// Knows `mpeg4` and `h264` (as `libx264`) for video and `aac` for audio.
pub struct StubCatalog;

impl CodecCatalog for StubCatalog {
    fn find_encoder(&self, name: &str, kind: MediaKind) -> Option<CodecHandle> {
        match (name, kind) {
            ("h264", MediaKind::Video) => Some(CodecHandle::new("libx264", kind)),
            ("mpeg4", MediaKind::Video) => Some(CodecHandle::new("mpeg4", kind)),
            ("aac", MediaKind::Audio) => Some(CodecHandle::new("aac", kind)),
            _ => None,
        }
    }
}

// ─── Conversion ───

/// Builds converters that emit one frame of silence per input frame,
/// whatever the rates. Refuses more than two channels.
#[derive(Clone, Default)]
pub struct StubConverterFactory {
    pub builds: Arc<AtomicUsize>,
}

impl StubConverterFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioConverterFactory for StubConverterFactory {
    fn build(
        &self,
        input: &AudioFormatDescriptor,
        output: &AudioFormatDescriptor,
    ) -> Result<Box<dyn AudioConverter>, BackendError> {
        if input.channels > 2 || output.channels > 2 {
            return Err(BackendError::new(format!(
                "unsupported channel layout: {} channels",
                input.channels.max(output.channels)
            )));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubConverter {
            input: *input,
            output: *output,
            scratch: SampleBuffer::unbounded(*input),
        }))
    }
}

struct StubConverter {
    input: AudioFormatDescriptor,
    output: AudioFormatDescriptor,
    scratch: SampleBuffer,
}

impl AudioConverter for StubConverter {
    fn input_format(&self) -> &AudioFormatDescriptor {
        &self.input
    }

    fn output_format(&self) -> &AudioFormatDescriptor {
        &self.output
    }

    fn convert(
        &mut self,
        output: &mut SampleBuffer,
        supply: &mut InputSupplier<'_>,
    ) -> Result<usize, BackendError> {
        let start = output.frames();
        while !output.is_full() {
            self.scratch.clear();
            let got = supply(output.remaining(), &mut self.scratch);
            if got == 0 {
                break;
            }
            output.append_silence(got);
        }
        Ok(output.frames() - start)
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

// ─── Encoders ───

#[derive(Debug, Default)]
pub struct EncoderLog {
    /// `(codec, global_header)` per opened encoder.
    pub opened: Vec<(String, bool)>,
    pub video_frames: Vec<i64>,
    /// `(pts, samples)` per audio frame.
    pub audio_frames: Vec<(i64, usize)>,
    pub eofs: usize,
}

/// Encoders that turn every frame into one packet, held back by `latency`
/// packets until end of input.
#[derive(Clone)]
pub struct StubEncoderFactory {
    pub log: Arc<Mutex<EncoderLog>>,
    pub pixel_format: FramePixelFormat,
    pub audio_frame_size: usize,
    pub latency: usize,
    pub fail_open: bool,
    pub fail_audio_open: bool,
    pub fail_send: bool,
    pub fail_receive: bool,
}

impl StubEncoderFactory {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(EncoderLog::default())),
            pixel_format: FramePixelFormat::Nv12,
            audio_frame_size: 1024,
            latency: 0,
            fail_open: false,
            fail_audio_open: false,
            fail_send: false,
            fail_receive: false,
        }
    }

    fn check_open(&self, codec: &CodecHandle, options: EncoderOptions) -> Result<(), BackendError> {
        if self.fail_open {
            return Err(BackendError::new(format!("{} refused to open", codec.name())));
        }
        self.log
            .lock()
            .unwrap()
            .opened
            .push((codec.name().to_string(), options.global_header));
        Ok(())
    }

    fn queue(&self, time_base: Rational) -> PacketQueue {
        PacketQueue {
            pending: VecDeque::new(),
            latency: self.latency,
            eof: false,
            time_base,
            fail_send: self.fail_send,
            fail_receive: self.fail_receive,
            log: self.log.clone(),
        }
    }
}

impl EncoderFactory for StubEncoderFactory {
    fn open_video(
        &self,
        codec: &CodecHandle,
        config: &VideoStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn VideoEncoder>, BackendError> {
        self.check_open(codec, options)?;
        Ok(Box::new(StubVideoEncoder {
            queue: self.queue(config.time_base()),
            codec_name: codec.name().to_string(),
            config: *config,
            pixel_format: self.pixel_format,
        }))
    }

    fn open_audio(
        &self,
        codec: &CodecHandle,
        config: &AudioStreamConfig,
        options: EncoderOptions,
    ) -> Result<Box<dyn AudioEncoder>, BackendError> {
        if self.fail_audio_open {
            return Err(BackendError::new(format!("{} refused to open", codec.name())));
        }
        self.check_open(codec, options)?;
        Ok(Box::new(StubAudioEncoder {
            queue: self.queue(config.time_base()),
            codec_name: codec.name().to_string(),
            config: *config,
            frame_size: self.audio_frame_size,
        }))
    }
}

struct PacketQueue {
    pending: VecDeque<EncodedPacket>,
    latency: usize,
    eof: bool,
    time_base: Rational,
    fail_send: bool,
    fail_receive: bool,
    log: Arc<Mutex<EncoderLog>>,
}

impl PacketQueue {
    fn push(&mut self, pts: i64, duration: i64) -> Result<(), BackendError> {
        if self.fail_send {
            return Err(BackendError::new("encoder rejected the frame"));
        }
        if self.eof {
            return Err(BackendError::new("frame after end of input"));
        }
        let is_keyframe = self.pending.is_empty() && pts == 0;
        self.pending.push_back(EncodedPacket {
            data: vec![0xAB; 16],
            pts: Some(pts),
            dts: Some(pts),
            duration,
            time_base: self.time_base,
            is_keyframe,
            stream_index: 0,
        });
        Ok(())
    }

    fn send_eof(&mut self) -> Result<(), BackendError> {
        self.eof = true;
        self.log.lock().unwrap().eofs += 1;
        Ok(())
    }

    fn receive(&mut self, packet: &mut EncodedPacket) -> Result<bool, BackendError> {
        if self.fail_receive {
            return Err(BackendError::new("encoder failed"));
        }
        if self.pending.len() > self.latency || (self.eof && !self.pending.is_empty()) {
            if let Some(next) = self.pending.pop_front() {
                *packet = next;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct StubVideoEncoder {
    queue: PacketQueue,
    codec_name: String,
    config: VideoStreamConfig,
    pixel_format: FramePixelFormat,
}

impl Encoder for StubVideoEncoder {
    fn time_base(&self) -> Rational {
        self.config.time_base()
    }

    fn parameters(&self) -> StreamParameters {
        StreamParameters {
            codec_name: self.codec_name.clone(),
            time_base: self.config.time_base(),
            bit_rate: self.config.bit_rate,
            extradata: Vec::new(),
            media: MediaParameters::Video {
                width: self.config.width,
                height: self.config.height,
                pixel_format: self.pixel_format,
                frame_rate: Rational::new(self.config.frame_rate as i32, 1),
            },
        }
    }

    fn send_eof(&mut self) -> Result<(), BackendError> {
        self.queue.send_eof()
    }

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<bool, BackendError> {
        self.queue.receive(packet)
    }
}

impl VideoEncoder for StubVideoEncoder {
    fn pixel_format(&self) -> FramePixelFormat {
        self.pixel_format
    }

    fn send_frame(&mut self, frame: &VideoFrame, pts: i64) -> Result<(), BackendError> {
        if frame.format() != self.pixel_format {
            return Err(BackendError::new("wrong pixel format"));
        }
        self.queue.push(pts, 1)?;
        self.queue.log.lock().unwrap().video_frames.push(pts);
        Ok(())
    }
}

struct StubAudioEncoder {
    queue: PacketQueue,
    codec_name: String,
    config: AudioStreamConfig,
    frame_size: usize,
}

impl Encoder for StubAudioEncoder {
    fn time_base(&self) -> Rational {
        self.config.time_base()
    }

    fn parameters(&self) -> StreamParameters {
        StreamParameters {
            codec_name: self.codec_name.clone(),
            time_base: self.config.time_base(),
            bit_rate: self.config.bit_rate,
            extradata: vec![0x12, 0x10],
            media: MediaParameters::Audio {
                sample_rate: self.config.sample_rate,
                channels: self.config.channels,
                frame_size: self.frame_size,
            },
        }
    }

    fn send_eof(&mut self) -> Result<(), BackendError> {
        self.queue.send_eof()
    }

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<bool, BackendError> {
        self.queue.receive(packet)
    }
}

impl AudioEncoder for StubAudioEncoder {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn input_format(&self) -> AudioFormatDescriptor {
        AudioFormatDescriptor::planar(
            self.config.sample_rate,
            self.config.channels,
            SampleFormat::F32,
        )
    }

    fn send_frame(&mut self, samples: &SampleBuffer, pts: i64) -> Result<(), BackendError> {
        if *samples.format() != self.input_format() || samples.frames() > self.frame_size {
            return Err(BackendError::new("malformed audio frame"));
        }
        self.queue.push(pts, samples.frames() as i64)?;
        self.queue
            .log
            .lock()
            .unwrap()
            .audio_frames
            .push((pts, samples.frames()));
        Ok(())
    }
}

// ─── Container ───

#[derive(Debug, Default)]
pub struct ContainerLog {
    pub created: Vec<PathBuf>,
    /// Codec name per stream created in the file.
    pub streams: Vec<String>,
    pub parameters: Vec<Option<StreamParameters>>,
    pub header_writes: usize,
    /// Packets as written, `stream_index` being the file's stream.
    pub packets: Vec<EncodedPacket>,
    pub trailer_writes: usize,
}

impl ContainerLog {
    pub fn packets_for(&self, stream_index: usize) -> Vec<&EncodedPacket> {
        self.packets
            .iter()
            .filter(|p| p.stream_index == stream_index)
            .collect()
    }
}

/// Containers that record every call instead of writing a file.
#[derive(Clone, Default)]
pub struct RecordingContainerFactory {
    pub log: Arc<Mutex<ContainerLog>>,
    pub global_header: bool,
    pub fail_create: bool,
    pub fail_add_stream: bool,
    pub fail_header: bool,
    pub fail_writes: bool,
}

impl RecordingContainerFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContainerFactory for RecordingContainerFactory {
    fn create(&self, path: &Path) -> Result<Box<dyn ContainerSink>, BackendError> {
        if self.fail_create {
            return Err(BackendError::new("permission denied"));
        }
        self.log.lock().unwrap().created.push(path.to_path_buf());
        Ok(Box::new(RecordingContainer {
            factory: self.clone(),
        }))
    }
}

struct RecordingContainer {
    factory: RecordingContainerFactory,
}

impl ContainerSink for RecordingContainer {
    fn requires_global_header(&self) -> bool {
        self.factory.global_header
    }

    fn add_stream(&mut self, codec: &CodecHandle) -> Result<usize, BackendError> {
        if self.factory.fail_add_stream {
            return Err(BackendError::new(format!("{} cannot be muxed", codec.name())));
        }
        let mut log = self.factory.log.lock().unwrap();
        log.streams.push(codec.name().to_string());
        log.parameters.push(None);
        Ok(log.streams.len() - 1)
    }

    fn configure_stream(
        &mut self,
        index: usize,
        parameters: &StreamParameters,
    ) -> Result<(), BackendError> {
        let mut log = self.factory.log.lock().unwrap();
        let entry = log
            .parameters
            .get_mut(index)
            .ok_or_else(|| BackendError::new("no such stream"))?;
        *entry = Some(parameters.clone());
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), BackendError> {
        if self.factory.fail_header {
            return Err(BackendError::new("header rejected"));
        }
        self.factory.log.lock().unwrap().header_writes += 1;
        Ok(())
    }

    fn write_packet(&mut self, index: usize, packet: &EncodedPacket) -> Result<(), BackendError> {
        if self.factory.fail_writes {
            return Err(BackendError::new("disk full"));
        }
        self.factory.log.lock().unwrap().packets.push(EncodedPacket {
            stream_index: index,
            ..packet.clone()
        });
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), BackendError> {
        self.factory.log.lock().unwrap().trailer_writes += 1;
        Ok(())
    }
}

// ─── Backend ───

pub fn stub_backend(encoders: StubEncoderFactory, containers: RecordingContainerFactory) -> WriterBackend {
    WriterBackend {
        codecs: Box::new(StubCatalog),
        encoders: Box::new(encoders),
        converters: Box::new(StubConverterFactory::new()),
        containers: Box::new(containers),
    }
}
