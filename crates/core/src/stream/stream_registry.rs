use crate::audio::domain::audio_buffer_list::AudioBufferList;
use crate::audio::domain::audio_converter::AudioConverterFactory;
use crate::audio::domain::format_converter::{EnsureOutcome, FormatConverter};
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::input_queue::InputQueue;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::codec::domain::codec_handle::MediaKind;
use crate::codec::domain::codec_session_manager::CodecSessionManager;
use crate::container::domain::container_muxer::{ContainerMuxer, OutputPhase};
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::AudioEncoder;
use crate::encoding::domain::encoder_factory::EncoderFactory;
use crate::encoding::domain::stream_config::{AudioStreamConfig, EncoderOptions, VideoStreamConfig};
use crate::shared::constants::MAX_STREAMS;
use crate::shared::error::{BackendError, Result, WriterError};
use crate::shared::slot::Slot;
use crate::stream::packet_pump::pump_packets;
use crate::stream::stream_phase::StreamPhase;
use crate::stream::stream_state::{AudioStream, StreamMedia, StreamState, StreamStats};
use crate::video::domain::video_frame::VideoFrame;
use crate::video::domain::video_sample::VideoSample;

/// Fixed-capacity table of stream slots and the per-slot state machine
/// `Empty → Configured → Opened → Writing → Finished → Freed`.
///
/// Every operation that produces packets takes the muxer explicitly; the
/// registry owns streams, the muxer owns the file.
pub struct StreamRegistry {
    slots: [Option<StreamState>; MAX_STREAMS],
    encoders: Box<dyn EncoderFactory>,
    converters: Box<dyn AudioConverterFactory>,
}

impl StreamRegistry {
    pub fn new(
        encoders: Box<dyn EncoderFactory>,
        converters: Box<dyn AudioConverterFactory>,
    ) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            encoders,
            converters,
        }
    }

    pub fn phase(&self, slot: Slot) -> StreamPhase {
        self.slots[slot.index()]
            .as_ref()
            .map_or(StreamPhase::Empty, |state| state.phase)
    }

    pub fn stats(&self, slot: Slot) -> Option<StreamStats> {
        self.slots[slot.index()].as_ref().map(|state| state.stats)
    }

    pub fn stream_index(&self, slot: Slot) -> Option<usize> {
        self.slots[slot.index()]
            .as_ref()
            .map(|state| state.stream_index)
    }

    pub fn is_faulted(&self, slot: Slot) -> bool {
        self.slots[slot.index()]
            .as_ref()
            .is_some_and(|state| state.faulted)
    }

    /// Configured encoder size of a video slot.
    pub fn video_dimensions(&self, slot: Slot) -> Option<(u32, u32)> {
        match self.media(slot)? {
            StreamMedia::Video(video) => Some((video.config.width, video.config.height)),
            StreamMedia::Audio(_) => None,
        }
    }

    /// Row length in bytes of `plane` of the slot's reusable frame.
    pub fn bytes_per_row(&self, slot: Slot, plane: usize) -> Option<usize> {
        match self.media(slot)? {
            StreamMedia::Video(video) => {
                let frame = video.frame.as_ref()?;
                (plane < frame.plane_count()).then(|| frame.stride(plane))
            }
            StreamMedia::Audio(_) => None,
        }
    }

    /// Samples per encoder frame of an opened audio slot.
    pub fn audio_frame_size(&self, slot: Slot) -> Option<usize> {
        match self.media(slot)? {
            StreamMedia::Audio(audio) => audio.frame.as_ref().map(|f| f.capacity()),
            StreamMedia::Video(_) => None,
        }
    }

    /// How many converters the slot has built so far.
    pub fn converter_generation(&self, slot: Slot) -> Option<u64> {
        match self.media(slot)? {
            StreamMedia::Audio(audio) => audio.converter.as_ref().map(|c| c.generation()),
            StreamMedia::Video(_) => None,
        }
    }

    pub fn add_video_stream(
        &mut self,
        slot: Slot,
        config: VideoStreamConfig,
        codecs: &CodecSessionManager,
        muxer: &mut ContainerMuxer,
    ) -> Result<()> {
        let codec = codecs.video_codec()?.clone();
        self.expect_empty(slot)?;
        let index = muxer.add_stream(&codec)?;
        log::debug!(
            "Stream {slot}: video {}x{} @ {} fps, {} bps with {} (container stream {index})",
            config.width,
            config.height,
            config.frame_rate,
            config.bit_rate,
            codec.name()
        );
        self.slots[slot.index()] = Some(StreamState::video(slot, codec, index, config));
        Ok(())
    }

    pub fn add_audio_stream(
        &mut self,
        slot: Slot,
        config: AudioStreamConfig,
        codecs: &CodecSessionManager,
        muxer: &mut ContainerMuxer,
    ) -> Result<()> {
        let codec = codecs.audio_codec()?.clone();
        self.expect_empty(slot)?;
        let index = muxer.add_stream(&codec)?;
        log::debug!(
            "Stream {slot}: audio {} Hz, {} bps with {} (container stream {index})",
            config.sample_rate,
            config.bit_rate,
            codec.name()
        );
        self.slots[slot.index()] = Some(StreamState::audio(slot, codec, index, config));
        Ok(())
    }

    pub fn open_video(&mut self, slot: Slot, muxer: &mut ContainerMuxer) -> Result<()> {
        let options = EncoderOptions {
            global_header: muxer.requires_global_header()?,
        };
        let state = Self::configured(&mut self.slots, slot, MediaKind::Video)?;
        let StreamMedia::Video(video) = &mut state.media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Video,
            });
        };

        let open_failed = |source: BackendError| WriterError::EncoderOpenFailed {
            slot: slot.index(),
            source,
        };
        let encoder = self
            .encoders
            .open_video(&state.codec, &video.config, options)
            .map_err(open_failed)?;
        muxer
            .configure_stream(state.stream_index, &encoder.parameters())
            .map_err(open_failed)?;

        video.frame = Some(VideoFrame::new(
            encoder.pixel_format(),
            video.config.width,
            video.config.height,
        ));
        video.encoder = Some(encoder);
        state.phase = StreamPhase::Opened;
        log::debug!("Stream {slot}: video encoder opened");
        Ok(())
    }

    pub fn open_audio(&mut self, slot: Slot, muxer: &mut ContainerMuxer) -> Result<()> {
        let options = EncoderOptions {
            global_header: muxer.requires_global_header()?,
        };
        let state = Self::configured(&mut self.slots, slot, MediaKind::Audio)?;
        let StreamMedia::Audio(audio) = &mut state.media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Audio,
            });
        };

        let open_failed = |source: BackendError| WriterError::EncoderOpenFailed {
            slot: slot.index(),
            source,
        };
        let encoder = self
            .encoders
            .open_audio(&state.codec, &audio.config, options)
            .map_err(open_failed)?;
        muxer
            .configure_stream(state.stream_index, &encoder.parameters())
            .map_err(open_failed)?;

        let output_format = encoder.input_format();
        audio.frame = Some(SampleBuffer::with_capacity(
            output_format,
            encoder.frame_size(),
        ));
        audio.converter = Some(FormatConverter::new(output_format));
        audio.next_pts = 0;
        log::debug!(
            "Stream {slot}: audio encoder opened, {} samples per frame of {output_format}",
            encoder.frame_size()
        );
        audio.encoder = Some(encoder);
        state.phase = StreamPhase::Opened;
        Ok(())
    }

    /// Write the container header once every added stream is opened.
    pub fn start_output(&mut self, muxer: &mut ContainerMuxer) -> Result<()> {
        match muxer.phase() {
            OutputPhase::Open => {}
            OutputPhase::Closed | OutputPhase::Freed => return Err(WriterError::NoOutputFile),
            OutputPhase::HeaderWritten | OutputPhase::TrailerWritten => {
                return Err(WriterError::HeaderAlreadyWritten)
            }
        }

        let mut added = 0;
        for state in self.slots.iter().flatten() {
            if state.phase != StreamPhase::Opened {
                return Err(WriterError::IncompleteConfiguration {
                    reason: format!("stream {} is {}", state.slot, state.phase),
                });
            }
            added += 1;
        }
        if added == 0 {
            return Err(WriterError::IncompleteConfiguration {
                reason: "no streams have been added".to_string(),
            });
        }

        muxer.write_header()?;
        for state in self.slots.iter_mut().flatten() {
            state.phase = StreamPhase::Writing;
        }
        log::info!("Output started with {added} stream(s)");
        Ok(())
    }

    pub fn write_video(
        &mut self,
        slot: Slot,
        sample: &VideoSample<'_>,
        muxer: &mut ContainerMuxer,
    ) -> Result<()> {
        sample.validate().map_err(WriterError::InvalidSampleBuffer)?;
        let state = Self::writing(&mut self.slots, slot, MediaKind::Video, muxer)?;
        let StreamState {
            media,
            packet,
            stats,
            faulted,
            stream_index,
            ..
        } = state;
        let StreamMedia::Video(video) = media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Video,
            });
        };
        let (Some(encoder), Some(frame)) = (video.encoder.as_mut(), video.frame.as_mut()) else {
            return Err(WriterError::NotConfigured { slot: slot.index() });
        };

        frame.fill_from_sample(sample);
        let pts = sample.pts.to_time_base(encoder.time_base());
        let result = encoder
            .send_frame(frame, pts)
            .map_err(|source| WriterError::EncodeFailed {
                slot: slot.index(),
                source,
            })
            .and_then(|()| {
                stats.frames_submitted += 1;
                pump_packets(encoder.as_mut(), packet, *stream_index, muxer, stats, slot)
            });
        fault_on_failure(faulted, slot, result).map(|_| ())
    }

    /// Make sure the slot converts from `input_format`, building a new
    /// converter only when the format differs from the last one applied.
    ///
    /// Input still queued in the previous format is discarded on rebuild.
    pub fn ensure_audio_converter_available(
        &mut self,
        slot: Slot,
        input_format: &AudioFormatDescriptor,
    ) -> Result<EnsureOutcome> {
        let state = Self::audio_state(&mut self.slots, slot)?;
        if !matches!(state.phase, StreamPhase::Opened | StreamPhase::Writing) {
            return Err(WriterError::InvalidPhase {
                slot: slot.index(),
                phase: state.phase,
                expected: StreamPhase::Writing,
            });
        }
        let StreamMedia::Audio(audio) = &mut state.media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Audio,
            });
        };
        ensure_converter(audio, self.converters.as_ref(), slot, input_format)
    }

    /// Hand up to `requested` frames of queued input to `fill`.
    ///
    /// This is the converter's pull callback exposed per slot. Returning
    /// fewer frames than requested means the queue ran dry.
    pub fn resample_audio_frame(
        &mut self,
        slot: Slot,
        requested: usize,
        fill: &mut SampleBuffer,
    ) -> Result<usize> {
        let state = Self::audio_state(&mut self.slots, slot)?;
        let StreamMedia::Audio(audio) = &mut state.media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Audio,
            });
        };
        let Some(queue) = audio.queue.as_mut() else {
            return Ok(0);
        };
        if fill.format() != queue.format() {
            return Err(WriterError::InvalidSampleBuffer(format!(
                "fill buffer is {}, queued input is {}",
                fill.format(),
                queue.format()
            )));
        }
        Ok(queue.resample_audio_frame(requested, fill))
    }

    /// Queue `buffers`, then convert and encode every full frame.
    ///
    /// `output_pts` is the capture time of the first input frame, in ticks of
    /// the stream's sample rate. Frames already converted in earlier calls
    /// come out first, so the first frame is stamped that many samples
    /// earlier. A trailing partial frame waits for the next call.
    pub fn write_audio(
        &mut self,
        slot: Slot,
        buffers: &AudioBufferList<'_>,
        input_format: &AudioFormatDescriptor,
        output_pts: i64,
        muxer: &mut ContainerMuxer,
    ) -> Result<()> {
        input_format
            .validate()
            .map_err(WriterError::InvalidSampleBuffer)?;
        let frames = buffers
            .frame_count(input_format)
            .map_err(WriterError::InvalidSampleBuffer)?;

        let converters = self.converters.as_ref();
        let state = Self::writing(&mut self.slots, slot, MediaKind::Audio, muxer)?;
        let StreamState {
            media,
            packet,
            stats,
            faulted,
            stream_index,
            ..
        } = state;
        let StreamMedia::Audio(audio) = media else {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Audio,
            });
        };

        ensure_converter(audio, converters, slot, input_format)?;
        let carried = audio.frame.as_ref().map_or(0, |f| f.frames())
            + audio.converter.as_ref().map_or(0, |c| c.buffered_frames());
        if let Some(queue) = audio.queue.as_mut() {
            queue.push(buffers, frames);
        }

        let mut out = AudioOutput {
            slot,
            stream_index: *stream_index,
            packet,
            stats,
            muxer,
        };
        let result = encode_full_frames(audio, &mut out, Some(output_pts - carried as i64));
        fault_on_failure(faulted, slot, result)
    }

    /// Drain the slot's encoder (and for audio its converter and partial
    /// frame) and mark it finished. Idempotent; a slot that never started
    /// writing is finished without touching the encoder.
    pub fn finish_stream(&mut self, slot: Slot, muxer: &mut ContainerMuxer) -> Result<()> {
        let Some(state) = self.slots[slot.index()].as_mut() else {
            return Ok(());
        };
        match state.phase {
            StreamPhase::Empty | StreamPhase::Finished | StreamPhase::Freed => return Ok(()),
            StreamPhase::Configured | StreamPhase::Opened => {
                state.phase = StreamPhase::Finished;
                log::debug!("Stream {slot}: finished before any output");
                return Ok(());
            }
            StreamPhase::Writing => {}
        }

        if state.faulted || muxer.is_faulted() {
            log::warn!("Stream {slot}: finishing without draining after an earlier failure");
            state.phase = StreamPhase::Finished;
            return Ok(());
        }

        let StreamState {
            media,
            packet,
            stats,
            faulted,
            stream_index,
            ..
        } = state;
        let result = match media {
            StreamMedia::Video(video) => match video.encoder.as_mut() {
                Some(encoder) => encoder
                    .send_eof()
                    .map_err(|source| WriterError::EncodeFailed {
                        slot: slot.index(),
                        source,
                    })
                    .and_then(|()| {
                        pump_packets(encoder.as_mut(), packet, *stream_index, muxer, stats, slot)
                    })
                    .map(|_| ()),
                None => Ok(()),
            },
            StreamMedia::Audio(audio) => {
                let mut out = AudioOutput {
                    slot,
                    stream_index: *stream_index,
                    packet,
                    stats,
                    muxer,
                };
                drain_audio(audio, &mut out)
            }
        };
        fault_on_failure(faulted, slot, result)?;

        state.phase = StreamPhase::Finished;
        log::debug!(
            "Stream {slot}: finished after {} packet(s), {} byte(s)",
            state.stats.packets_written,
            state.stats.bytes_written
        );
        Ok(())
    }

    /// Fails with the first slot that still blocks the trailer.
    pub fn check_all_finished(&self) -> Result<()> {
        for state in self.slots.iter().flatten() {
            if !state.phase.is_finalized() {
                return Err(WriterError::IncompleteFinalization {
                    slot: state.slot.index(),
                    phase: state.phase,
                });
            }
        }
        Ok(())
    }

    /// Release the slot's encoder and buffers. Idempotent.
    ///
    /// Before the header is written the slot's container stream is withdrawn
    /// as well and the slot goes back to `Empty`, so the output can still be
    /// started without it (or with a new stream in its place).
    pub fn free_stream(&mut self, slot: Slot, muxer: &mut ContainerMuxer) {
        let Some(state) = self.slots[slot.index()].as_mut() else {
            return;
        };
        match state.phase {
            StreamPhase::Freed => return,
            StreamPhase::Configured | StreamPhase::Opened
                if muxer.phase() == OutputPhase::Open =>
            {
                if let Err(e) = muxer.remove_stream(state.stream_index) {
                    log::warn!("Stream {slot}: cannot withdraw container stream: {e}");
                }
                state.release();
                self.slots[slot.index()] = None;
                log::debug!("Stream {slot}: freed before the header, slot is empty again");
                return;
            }
            StreamPhase::Writing => {
                log::warn!("Stream {slot}: freed while still writing, buffered samples are lost");
            }
            _ => {}
        }
        state.release();
        state.phase = StreamPhase::Freed;
        log::debug!("Stream {slot}: freed");
    }

    pub fn free_all(&mut self, muxer: &mut ContainerMuxer) {
        for slot in Slot::all() {
            self.free_stream(slot, muxer);
        }
    }

    fn media(&self, slot: Slot) -> Option<&StreamMedia> {
        self.slots[slot.index()].as_ref().map(|state| &state.media)
    }

    fn expect_empty(&self, slot: Slot) -> Result<()> {
        match &self.slots[slot.index()] {
            None => Ok(()),
            Some(state) => Err(WriterError::InvalidPhase {
                slot: slot.index(),
                phase: state.phase,
                expected: StreamPhase::Empty,
            }),
        }
    }

    /// The slot's state, if it is a `kind` stream ready to be opened.
    fn configured(
        slots: &mut [Option<StreamState>; MAX_STREAMS],
        slot: Slot,
        kind: MediaKind,
    ) -> Result<&mut StreamState> {
        let state = slots[slot.index()]
            .as_mut()
            .ok_or(WriterError::NotConfigured { slot: slot.index() })?;
        match state.phase {
            StreamPhase::Configured => {}
            StreamPhase::Empty => return Err(WriterError::NotConfigured { slot: slot.index() }),
            _ => return Err(WriterError::AlreadyOpened { slot: slot.index() }),
        }
        if state.kind() != kind {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: kind,
            });
        }
        Ok(state)
    }

    /// The slot's state, if it is a healthy `kind` stream in `Writing`.
    fn writing<'a>(
        slots: &'a mut [Option<StreamState>; MAX_STREAMS],
        slot: Slot,
        kind: MediaKind,
        muxer: &ContainerMuxer,
    ) -> Result<&'a mut StreamState> {
        let state = slots[slot.index()]
            .as_mut()
            .ok_or(WriterError::NotConfigured { slot: slot.index() })?;
        if state.kind() != kind {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: kind,
            });
        }
        if state.faulted {
            return Err(WriterError::StreamFaulted { slot: slot.index() });
        }
        if state.phase != StreamPhase::Writing {
            return Err(WriterError::InvalidPhase {
                slot: slot.index(),
                phase: state.phase,
                expected: StreamPhase::Writing,
            });
        }
        if muxer.is_faulted() {
            return Err(WriterError::OutputFaulted);
        }
        Ok(state)
    }

    fn audio_state(
        slots: &mut [Option<StreamState>; MAX_STREAMS],
        slot: Slot,
    ) -> Result<&mut StreamState> {
        let state = slots[slot.index()]
            .as_mut()
            .ok_or(WriterError::NotConfigured { slot: slot.index() })?;
        if state.kind() != MediaKind::Audio {
            return Err(WriterError::MediaKindMismatch {
                slot: slot.index(),
                expected: MediaKind::Audio,
            });
        }
        Ok(state)
    }
}

/// Where encoded audio goes.
struct AudioOutput<'a> {
    slot: Slot,
    stream_index: usize,
    packet: &'a mut EncodedPacket,
    stats: &'a mut StreamStats,
    muxer: &'a mut ContainerMuxer,
}

fn ensure_converter(
    audio: &mut AudioStream,
    factory: &dyn AudioConverterFactory,
    slot: Slot,
    input_format: &AudioFormatDescriptor,
) -> Result<EnsureOutcome> {
    let converter = audio
        .converter
        .as_mut()
        .ok_or(WriterError::NotConfigured { slot: slot.index() })?;

    match converter.ensure(factory, input_format) {
        Ok(EnsureOutcome::Reused) => Ok(EnsureOutcome::Reused),
        Ok(EnsureOutcome::Built) => {
            let dropped = audio.queue.as_ref().map_or(0, |q| q.available());
            if dropped > 0 {
                log::warn!(
                    "Stream {slot}: input format changed, dropping {dropped} queued frame(s)"
                );
            }
            audio.queue = Some(InputQueue::new(*input_format));
            Ok(EnsureOutcome::Built)
        }
        Err(source) => {
            audio.queue = None;
            Err(WriterError::ConverterBuildFailed {
                slot: slot.index(),
                source,
            })
        }
    }
}

/// Convert queued input and encode every frame that fills up.
///
/// With an `anchor`, the k-th frame emitted is stamped `anchor + k *
/// frame_size`; without one frames follow on from the previous frame.
/// Stamps never go below the end of the previous frame.
fn encode_full_frames(
    audio: &mut AudioStream,
    out: &mut AudioOutput<'_>,
    anchor: Option<i64>,
) -> Result<()> {
    let slot = out.slot;
    let AudioStream {
        encoder,
        frame,
        converter,
        queue,
        next_pts,
        ..
    } = audio;
    let (Some(encoder), Some(frame), Some(converter)) =
        (encoder.as_mut(), frame.as_mut(), converter.as_mut())
    else {
        return Err(WriterError::NotConfigured { slot: slot.index() });
    };
    if !converter.is_ready() {
        return Ok(());
    }

    let mut emitted: i64 = 0;
    loop {
        converter
            .convert(frame, &mut |requested: usize, fill: &mut SampleBuffer| {
                queue
                    .as_mut()
                    .map_or(0, |q| q.resample_audio_frame(requested, fill))
            })
            .map_err(|source| WriterError::ConversionFailed {
                slot: slot.index(),
                source,
            })?;
        if !frame.is_full() {
            return Ok(());
        }

        let pts = anchor.map_or(*next_pts, |a| (a + emitted).max(*next_pts));
        let count = frame.frames() as i64;
        send_audio_frame(encoder.as_mut(), frame, pts, out)?;
        *next_pts = pts + count;
        emitted += count;
    }
}

/// End of stream: everything still queued or buffered in the converter is
/// encoded, including a final short frame, then the encoder is drained.
fn drain_audio(audio: &mut AudioStream, out: &mut AudioOutput<'_>) -> Result<()> {
    let slot = out.slot;
    encode_full_frames(audio, out, None)?;
    if let Some(converter) = audio.converter.as_mut() {
        converter
            .flush()
            .map_err(|source| WriterError::ConversionFailed {
                slot: slot.index(),
                source,
            })?;
    }
    encode_full_frames(audio, out, None)?;

    let (Some(encoder), Some(frame)) = (audio.encoder.as_mut(), audio.frame.as_mut()) else {
        return Ok(());
    };
    if !frame.is_empty() {
        let pts = audio.next_pts;
        let count = frame.frames() as i64;
        send_audio_frame(encoder.as_mut(), frame, pts, out)?;
        audio.next_pts = pts + count;
    }
    encoder
        .send_eof()
        .map_err(|source| WriterError::EncodeFailed {
            slot: slot.index(),
            source,
        })?;
    pump_packets(
        encoder.as_mut(),
        out.packet,
        out.stream_index,
        out.muxer,
        out.stats,
        slot,
    )?;
    Ok(())
}

fn send_audio_frame(
    encoder: &mut dyn AudioEncoder,
    frame: &mut SampleBuffer,
    pts: i64,
    out: &mut AudioOutput<'_>,
) -> Result<()> {
    let slot = out.slot;
    encoder
        .send_frame(frame, pts)
        .map_err(|source| WriterError::EncodeFailed {
            slot: slot.index(),
            source,
        })?;
    frame.clear();
    out.stats.frames_submitted += 1;
    pump_packets(
        encoder,
        out.packet,
        out.stream_index,
        out.muxer,
        out.stats,
        slot,
    )?;
    Ok(())
}

/// Encode and conversion failures stop the stream for good.
fn fault_on_failure<T>(faulted: &mut bool, slot: Slot, result: Result<T>) -> Result<T> {
    if let Err(e @ (WriterError::EncodeFailed { .. } | WriterError::ConversionFailed { .. })) =
        &result
    {
        log::error!("Stream {slot}: {e}; no further samples will be accepted");
        *faulted = true;
    }
    result
}
