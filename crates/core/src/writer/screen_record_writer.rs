use std::path::Path;

use crate::audio::domain::audio_buffer_list::AudioBufferList;
use crate::audio::domain::format_converter::EnsureOutcome;
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::codec::domain::codec_handle::CodecHandle;
use crate::codec::domain::codec_session_manager::CodecSessionManager;
use crate::container::domain::container_muxer::{ContainerMuxer, OutputPhase};
use crate::encoding::domain::stream_config::{AudioStreamConfig, VideoStreamConfig};
use crate::shared::error::Result;
use crate::shared::slot::Slot;
use crate::stream::stream_phase::StreamPhase;
use crate::stream::stream_registry::StreamRegistry;
use crate::stream::stream_state::StreamStats;
use crate::video::domain::video_sample::{self, VideoSample};

use super::writer_backend::WriterBackend;

/// Writes captured video and audio into one container file.
///
/// Typical use:
///
/// 1. resolve codecs with [`open_video_codec`](Self::open_video_codec) and
///    [`open_audio_codec`](Self::open_audio_codec);
/// 2. [`open_output_file`](Self::open_output_file);
/// 3. add and open every stream, then [`start_output`](Self::start_output);
/// 4. feed [`write_video`](Self::write_video) / [`write_audio`](Self::write_audio);
/// 5. [`finish_stream`](Self::finish_stream) for each slot, then
///    [`finish_output`](Self::finish_output);
/// 6. [`free_output`](Self::free_output).
///
/// The writer is `Send` but not `Sync`. Callers delivering audio and video
/// from different threads must serialize access themselves.
pub struct ScreenRecordWriter {
    codecs: CodecSessionManager,
    registry: StreamRegistry,
    muxer: ContainerMuxer,
}

impl ScreenRecordWriter {
    pub fn new(backend: WriterBackend) -> Self {
        let WriterBackend {
            codecs,
            encoders,
            converters,
            containers,
        } = backend;
        Self {
            codecs: CodecSessionManager::new(codecs),
            registry: StreamRegistry::new(encoders, converters),
            muxer: ContainerMuxer::new(containers),
        }
    }

    // ─── Codecs ───

    pub fn open_video_codec(&mut self, name: &str) -> Result<&CodecHandle> {
        self.codecs.resolve_video_codec(name)
    }

    pub fn open_audio_codec(&mut self, name: &str) -> Result<&CodecHandle> {
        self.codecs.resolve_audio_codec(name)
    }

    // ─── Output ───

    pub fn open_output_file(&mut self, filename: impl AsRef<Path>) -> Result<()> {
        self.muxer.open_output_file(filename.as_ref())
    }

    pub fn filename(&self) -> Option<&Path> {
        self.muxer.path()
    }

    pub fn output_phase(&self) -> OutputPhase {
        self.muxer.phase()
    }

    // ─── Setup ───

    pub fn add_video_stream(
        &mut self,
        slot: usize,
        width: i32,
        height: i32,
        frame_rate: i32,
        bit_rate: i64,
    ) -> Result<()> {
        let slot = Slot::new(slot)?;
        let config = VideoStreamConfig::from_raw(width, height, frame_rate, bit_rate)?;
        self.registry
            .add_video_stream(slot, config, &self.codecs, &mut self.muxer)
    }

    pub fn add_audio_stream(&mut self, slot: usize, sample_rate: i32, bit_rate: i64) -> Result<()> {
        let slot = Slot::new(slot)?;
        let config = AudioStreamConfig::from_raw(sample_rate, bit_rate)?;
        self.registry
            .add_audio_stream(slot, config, &self.codecs, &mut self.muxer)
    }

    pub fn open_video(&mut self, slot: usize) -> Result<()> {
        self.registry.open_video(Slot::new(slot)?, &mut self.muxer)
    }

    pub fn open_audio(&mut self, slot: usize) -> Result<()> {
        self.registry.open_audio(Slot::new(slot)?, &mut self.muxer)
    }

    /// Write the container header. Every added stream must be opened; on
    /// `IncompleteConfiguration` nothing is written and the call can be
    /// repeated once the missing streams are open.
    pub fn start_output(&mut self) -> Result<()> {
        self.registry.start_output(&mut self.muxer)
    }

    // ─── Video ───

    pub fn check_if_video_sample_is_valid(&self, sample: &VideoSample<'_>) -> bool {
        video_sample::check_if_video_sample_is_valid(sample)
    }

    pub fn write_video(&mut self, slot: usize, sample: &VideoSample<'_>) -> Result<()> {
        self.registry
            .write_video(Slot::new(slot)?, sample, &mut self.muxer)
    }

    // ─── Audio ───

    pub fn ensure_audio_converter_available(
        &mut self,
        slot: usize,
        input_format: &AudioFormatDescriptor,
    ) -> Result<EnsureOutcome> {
        self.registry
            .ensure_audio_converter_available(Slot::new(slot)?, input_format)
    }

    pub fn resample_audio_frame(
        &mut self,
        slot: usize,
        requested: usize,
        fill: &mut SampleBuffer,
    ) -> Result<usize> {
        self.registry
            .resample_audio_frame(Slot::new(slot)?, requested, fill)
    }

    /// `output_pts` is the capture time of the first frame in `buffers`,
    /// counted in samples at the stream's output rate.
    pub fn write_audio(
        &mut self,
        slot: usize,
        buffers: &AudioBufferList<'_>,
        input_format: &AudioFormatDescriptor,
        output_pts: i64,
    ) -> Result<()> {
        self.registry.write_audio(
            Slot::new(slot)?,
            buffers,
            input_format,
            output_pts,
            &mut self.muxer,
        )
    }

    // ─── Teardown ───

    pub fn finish_stream(&mut self, slot: usize) -> Result<()> {
        self.registry
            .finish_stream(Slot::new(slot)?, &mut self.muxer)
    }

    /// Write the trailer. Every stream must be finished (or freed) first.
    /// Calling this again after success does nothing.
    pub fn finish_output(&mut self) -> Result<()> {
        if self.muxer.phase() == OutputPhase::HeaderWritten {
            self.registry.check_all_finished()?;
        }
        self.muxer.finish_output()
    }

    pub fn free_stream(&mut self, slot: usize) -> Result<()> {
        self.registry.free_stream(Slot::new(slot)?, &mut self.muxer);
        Ok(())
    }

    /// Release every stream and close the file. Idempotent.
    pub fn free_output(&mut self) {
        self.registry.free_all(&mut self.muxer);
        self.muxer.free_output();
    }

    // ─── Accessors ───

    pub fn stream_phase(&self, slot: usize) -> Result<StreamPhase> {
        Ok(self.registry.phase(Slot::new(slot)?))
    }

    pub fn stream_stats(&self, slot: usize) -> Result<Option<StreamStats>> {
        Ok(self.registry.stats(Slot::new(slot)?))
    }

    pub fn video_width(&self, slot: usize) -> Result<Option<u32>> {
        Ok(self
            .registry
            .video_dimensions(Slot::new(slot)?)
            .map(|(width, _)| width))
    }

    pub fn video_height(&self, slot: usize) -> Result<Option<u32>> {
        Ok(self
            .registry
            .video_dimensions(Slot::new(slot)?)
            .map(|(_, height)| height))
    }

    pub fn bytes_per_row(&self, slot: usize, plane: usize) -> Result<Option<usize>> {
        Ok(self.registry.bytes_per_row(Slot::new(slot)?, plane))
    }

    pub fn audio_frame_size(&self, slot: usize) -> Result<Option<usize>> {
        Ok(self.registry.audio_frame_size(Slot::new(slot)?))
    }

    pub fn converter_generation(&self, slot: usize) -> Result<Option<u64>> {
        Ok(self.registry.converter_generation(Slot::new(slot)?))
    }
}

/// Dropping an unfinished writer frees it; the muxer warns that the file
/// is left unfinalized.
impl Drop for ScreenRecordWriter {
    fn drop(&mut self) {
        self.free_output();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::format_descriptor::{ByteOrder, SampleFormat};
    use crate::shared::error::WriterError;
    use crate::shared::media_time::MediaTime;
    use crate::test_support::{stub_backend, RecordingContainerFactory, StubEncoderFactory};
    use rstest::rstest;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    fn writer_with(containers: RecordingContainerFactory) -> ScreenRecordWriter {
        ScreenRecordWriter::new(stub_backend(StubEncoderFactory::new(), containers))
    }

    fn started_writer(containers: RecordingContainerFactory) -> ScreenRecordWriter {
        let mut writer = writer_with(containers);
        writer.open_video_codec("h264").unwrap();
        writer.open_audio_codec("aac").unwrap();
        writer.open_output_file("capture.mkv").unwrap();
        writer.add_video_stream(0, WIDTH as i32, HEIGHT as i32, 30, 4_000_000).unwrap();
        writer.add_audio_stream(1, 48000, 128_000).unwrap();
        writer.open_video(0).unwrap();
        writer.open_audio(1).unwrap();
        writer.start_output().unwrap();
        writer
    }

    fn write_frame(writer: &mut ScreenRecordWriter, index: i64) -> Result<()> {
        let luma = vec![80u8; (WIDTH * HEIGHT) as usize];
        let chroma = vec![128u8; (WIDTH * HEIGHT / 2) as usize];
        let sample = VideoSample {
            width: WIDTH,
            height: HEIGHT,
            luma: &luma,
            luma_stride: WIDTH as usize,
            chroma: &chroma,
            chroma_stride: WIDTH as usize,
            pts: MediaTime::new(index, 30),
        };
        writer.write_video(0, &sample)
    }

    #[test]
    fn test_full_lifecycle_writes_header_packets_and_trailer() {
        let containers = RecordingContainerFactory::new();
        let log = containers.log.clone();
        let mut writer = started_writer(containers);

        for i in 0..30 {
            write_frame(&mut writer, i).unwrap();
        }
        let samples = vec![0u8; 441 * 4];
        let format = AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16);
        for i in 0..10 {
            writer
                .write_audio(1, &AudioBufferList::single(&samples), &format, i * 480)
                .unwrap();
        }
        writer.finish_stream(0).unwrap();
        writer.finish_stream(1).unwrap();
        writer.finish_output().unwrap();
        writer.finish_output().unwrap();
        writer.free_output();

        let log = log.lock().unwrap();
        assert_eq!(log.streams, vec!["libx264".to_string(), "aac".to_string()]);
        assert_eq!(log.header_writes, 1);
        assert_eq!(log.trailer_writes, 1);
        assert_eq!(log.packets_for(0).len(), 30);
        assert_eq!(log.packets_for(1).len(), 5);
        assert_eq!(writer.stream_phase(0).unwrap(), StreamPhase::Freed);
        assert_eq!(writer.output_phase(), OutputPhase::Freed);
    }

    #[test]
    fn test_unknown_codec_keeps_previous_selection() {
        let mut writer = writer_with(RecordingContainerFactory::new());
        writer.open_video_codec("mpeg4").unwrap();
        assert!(matches!(
            writer.open_video_codec("aac"),
            Err(WriterError::CodecNotFound { .. })
        ));
        writer.open_output_file("capture.mkv").unwrap();
        writer.add_video_stream(0, 64, 48, 30, 1_000_000).unwrap();
    }

    #[rstest]
    #[case::zero_width(0, 0, 48, 30, 1_000_000)]
    #[case::negative_rate(0, 64, 48, -1, 1_000_000)]
    #[case::odd_height(0, 64, 47, 30, 1_000_000)]
    #[case::zero_bit_rate(0, 64, 48, 30, 0)]
    fn test_bad_video_parameters_are_rejected(
        #[case] slot: usize,
        #[case] width: i32,
        #[case] height: i32,
        #[case] frame_rate: i32,
        #[case] bit_rate: i64,
    ) {
        let mut writer = writer_with(RecordingContainerFactory::new());
        writer.open_video_codec("mpeg4").unwrap();
        writer.open_output_file("capture.mkv").unwrap();
        assert!(matches!(
            writer.add_video_stream(slot, width, height, frame_rate, bit_rate),
            Err(WriterError::InvalidParameters(_))
        ));
        assert_eq!(writer.stream_phase(slot).unwrap(), StreamPhase::Empty);
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut writer = writer_with(RecordingContainerFactory::new());
        assert!(matches!(
            writer.add_audio_stream(8, 48000, 128_000),
            Err(WriterError::SlotOutOfRange { slot: 8, max: 8 })
        ));
        assert!(matches!(
            writer.free_stream(9),
            Err(WriterError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_second_output_file_is_rejected() {
        let mut writer = writer_with(RecordingContainerFactory::new());
        writer.open_output_file("a.mkv").unwrap();
        assert!(matches!(
            writer.open_output_file("b.mkv"),
            Err(WriterError::OutputAlreadyOpen)
        ));
        assert_eq!(writer.filename(), Some(Path::new("a.mkv")));
    }

    #[test]
    fn test_finish_output_waits_for_every_stream() {
        let containers = RecordingContainerFactory::new();
        let log = containers.log.clone();
        let mut writer = started_writer(containers);
        writer.finish_stream(0).unwrap();

        assert!(matches!(
            writer.finish_output(),
            Err(WriterError::IncompleteFinalization { slot: 1, .. })
        ));
        assert_eq!(log.lock().unwrap().trailer_writes, 0);

        writer.free_stream(1).unwrap();
        writer.finish_output().unwrap();
        assert_eq!(log.lock().unwrap().trailer_writes, 1);
    }

    #[test]
    fn test_stream_freed_before_start_is_dropped_from_the_file() {
        let containers = RecordingContainerFactory::new();
        let log = containers.log.clone();
        let mut writer = writer_with(containers);
        writer.open_video_codec("h264").unwrap();
        writer.open_audio_codec("aac").unwrap();
        writer.open_output_file("capture.mkv").unwrap();
        writer.add_video_stream(0, WIDTH as i32, HEIGHT as i32, 30, 4_000_000).unwrap();
        writer.add_audio_stream(1, 48000, 128_000).unwrap();
        writer.open_video(0).unwrap();
        writer.free_stream(1).unwrap();
        assert_eq!(writer.stream_phase(1).unwrap(), StreamPhase::Empty);

        writer.start_output().unwrap();
        write_frame(&mut writer, 0).unwrap();
        writer.finish_stream(0).unwrap();
        writer.finish_output().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.streams, vec!["libx264".to_string()]);
        assert_eq!(log.trailer_writes, 1);
    }

    #[test]
    fn test_finish_output_before_start() {
        let mut writer = writer_with(RecordingContainerFactory::new());
        writer.open_output_file("capture.mkv").unwrap();
        assert!(matches!(
            writer.finish_output(),
            Err(WriterError::HeaderNotWritten)
        ));
    }

    #[test]
    fn test_free_output_is_idempotent() {
        let mut writer = started_writer(RecordingContainerFactory::new());
        writer.free_output();
        writer.free_output();
        assert_eq!(writer.stream_phase(1).unwrap(), StreamPhase::Freed);
        assert!(write_frame(&mut writer, 0).is_err());
    }

    #[test]
    fn test_accessors_report_stream_layout() {
        let writer = started_writer(RecordingContainerFactory::new());
        assert_eq!(writer.video_width(0).unwrap(), Some(WIDTH));
        assert_eq!(writer.video_height(0).unwrap(), Some(HEIGHT));
        assert_eq!(writer.bytes_per_row(0, 0).unwrap(), Some(WIDTH as usize));
        assert_eq!(writer.audio_frame_size(1).unwrap(), Some(1024));
        assert_eq!(writer.video_width(1).unwrap(), None);
        assert_eq!(writer.converter_generation(1).unwrap(), Some(0));
    }

    #[test]
    fn test_converter_is_cached_per_format() {
        let mut writer = started_writer(RecordingContainerFactory::new());
        let screen = AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16);
        let mic = AudioFormatDescriptor::interleaved(48000, 1, SampleFormat::F32)
            .with_byte_order(ByteOrder::Big);

        assert_eq!(
            writer.ensure_audio_converter_available(1, &screen).unwrap(),
            EnsureOutcome::Built
        );
        assert_eq!(
            writer.ensure_audio_converter_available(1, &screen).unwrap(),
            EnsureOutcome::Reused
        );
        assert_eq!(
            writer.ensure_audio_converter_available(1, &mic).unwrap(),
            EnsureOutcome::Built
        );
        assert_eq!(writer.converter_generation(1).unwrap(), Some(2));

        let mut fill = SampleBuffer::unbounded(mic);
        assert_eq!(writer.resample_audio_frame(1, 256, &mut fill).unwrap(), 0);
    }

    #[test]
    fn test_video_sample_check() {
        let writer = writer_with(RecordingContainerFactory::new());
        let luma = vec![0u8; 16];
        let chroma = vec![0u8; 8];
        let sample = VideoSample {
            width: 4,
            height: 4,
            luma: &luma,
            luma_stride: 4,
            chroma: &chroma,
            chroma_stride: 4,
            pts: MediaTime::new(0, 600),
        };
        assert!(writer.check_if_video_sample_is_valid(&sample));
        assert!(!writer.check_if_video_sample_is_valid(&sample.with_pts(MediaTime::new(0, 0))));
    }

    // ─── FFmpeg round trips ───

    mod ffmpeg {
        use super::*;
        use approx::assert_abs_diff_eq;
        use ffmpeg_next::media::Type;
        use tempfile::TempDir;

        const W: u32 = 160;
        const H: u32 = 120;

        fn pattern(frame: u32) -> (Vec<u8>, Vec<u8>) {
            let luma = (0..W * H)
                .map(|i| ((i % W + frame * 4) % 220 + 16) as u8)
                .collect();
            let chroma = (0..W * H / 2)
                .map(|i| if i % 2 == 0 { 100 } else { 156 })
                .collect();
            (luma, chroma)
        }

        fn tone(frames: usize, offset: usize) -> Vec<u8> {
            (0..frames)
                .flat_map(|i| {
                    let t = (offset + i) as f32 / 44100.0;
                    let v = ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16;
                    let bytes = v.to_ne_bytes();
                    [bytes[0], bytes[1], bytes[0], bytes[1]]
                })
                .collect()
        }

        fn record(path: &Path, with_audio: bool) {
            let mut writer = ScreenRecordWriter::new(WriterBackend::ffmpeg().unwrap());
            writer.open_video_codec("mpeg4").unwrap();
            writer.open_audio_codec("aac").unwrap();
            writer.open_output_file(path).unwrap();
            writer.add_video_stream(0, W as i32, H as i32, 30, 400_000).unwrap();
            writer.open_video(0).unwrap();
            if with_audio {
                writer.add_audio_stream(1, 48000, 128_000).unwrap();
                writer.open_audio(1).unwrap();
            }
            writer.start_output().unwrap();

            let format = AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16);
            for i in 0..30u32 {
                let (luma, chroma) = pattern(i);
                let sample = VideoSample {
                    width: W,
                    height: H,
                    luma: &luma,
                    luma_stride: W as usize,
                    chroma: &chroma,
                    chroma_stride: W as usize,
                    pts: MediaTime::new(i as i64, 30),
                };
                assert!(writer.check_if_video_sample_is_valid(&sample));
                writer.write_video(0, &sample).unwrap();

                if with_audio {
                    let samples = tone(1470, i as usize * 1470);
                    writer
                        .write_audio(
                            1,
                            &AudioBufferList::single(&samples),
                            &format,
                            i as i64 * 1600,
                        )
                        .unwrap();
                }
            }

            writer.finish_stream(0).unwrap();
            if with_audio {
                writer.finish_stream(1).unwrap();
            }
            writer.finish_output().unwrap();
            writer.free_output();
        }

        #[test]
        fn test_video_only_file_has_thirty_frames() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("video.mkv");
            record(&path, false);

            let mut input = ffmpeg_next::format::input(&path).unwrap();
            assert_eq!(input.streams().count(), 1);
            let stream = input.streams().best(Type::Video).unwrap();
            let index = stream.index();
            let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                .unwrap()
                .decoder()
                .video()
                .unwrap();
            assert_eq!((decoder.width(), decoder.height()), (W, H));

            let packets = input
                .packets()
                .filter(|(stream, _)| stream.index() == index)
                .count();
            assert_eq!(packets, 30);
        }

        #[test]
        fn test_stream_freed_before_start_leaves_a_playable_file() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("video.mkv");
            let mut writer = ScreenRecordWriter::new(WriterBackend::ffmpeg().unwrap());
            writer.open_video_codec("mpeg4").unwrap();
            writer.open_audio_codec("aac").unwrap();
            writer.open_output_file(&path).unwrap();
            writer.add_audio_stream(0, 48000, 128_000).unwrap();
            writer.add_video_stream(1, W as i32, H as i32, 30, 400_000).unwrap();
            writer.open_audio(0).unwrap();
            writer.open_video(1).unwrap();
            writer.free_stream(0).unwrap();
            writer.start_output().unwrap();

            for i in 0..10u32 {
                let (luma, chroma) = pattern(i);
                let sample = VideoSample {
                    width: W,
                    height: H,
                    luma: &luma,
                    luma_stride: W as usize,
                    chroma: &chroma,
                    chroma_stride: W as usize,
                    pts: MediaTime::new(i as i64, 30),
                };
                writer.write_video(1, &sample).unwrap();
            }
            writer.finish_stream(1).unwrap();
            writer.finish_output().unwrap();
            writer.free_output();

            let mut input = ffmpeg_next::format::input(&path).unwrap();
            assert_eq!(input.streams().count(), 1);
            assert!(input.streams().best(Type::Audio).is_none());
            assert_eq!(input.packets().count(), 10);
        }

        #[test]
        fn test_audio_and_video_file_lasts_one_second() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("capture.mkv");
            record(&path, true);

            let input = ffmpeg_next::format::input(&path).unwrap();
            assert_eq!(input.streams().count(), 2);
            let audio = input.streams().best(Type::Audio).unwrap();
            let decoder = ffmpeg_next::codec::context::Context::from_parameters(audio.parameters())
                .unwrap()
                .decoder()
                .audio()
                .unwrap();
            assert_eq!(decoder.rate(), 48000);

            let seconds = input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
            assert_abs_diff_eq!(seconds, 1.0, epsilon = 0.15);
        }
    }
}
