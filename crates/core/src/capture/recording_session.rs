use std::path::Path;

use crate::audio::domain::audio_buffer_list::AudioBufferList;
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::capture::recording_profile::{
    RecordingProfile, MIC_AUDIO_SLOT, SCREEN_AUDIO_SLOT, VIDEO_SLOT,
};
use crate::capture::session_clock::SessionClock;
use crate::shared::error::{Result, WriterError};
use crate::shared::media_time::MediaTime;
use crate::video::domain::video_sample::VideoSample;
use crate::writer::screen_record_writer::ScreenRecordWriter;

/// What a session did with the samples it was handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub video_frames: u64,
    pub screen_audio_buffers: u64,
    pub mic_audio_buffers: u64,
    /// Samples dropped for arriving before the first frame, out of order, or
    /// malformed.
    pub dropped: u64,
}

/// Feeds captured screen video, screen audio and microphone audio into a
/// [`ScreenRecordWriter`].
///
/// Streams are created when the first video frame arrives, sized to that
/// frame. Audio arriving earlier is dropped.
pub struct RecordingSession {
    writer: ScreenRecordWriter,
    profile: RecordingProfile,
    clock: SessionClock,
    output_started: bool,
    stats: SessionStats,
}

impl RecordingSession {
    pub fn new(writer: ScreenRecordWriter, profile: RecordingProfile) -> Result<Self> {
        profile.validate()?;
        let clock = SessionClock::new(
            profile.frame_rate,
            profile.screen_audio.sample_rate,
            profile.microphone.map_or(0, |mic| mic.sample_rate),
        );
        Ok(Self {
            writer,
            profile,
            clock,
            output_started: false,
            stats: SessionStats::default(),
        })
    }

    pub fn profile(&self) -> &RecordingProfile {
        &self.profile
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn writer(&self) -> &ScreenRecordWriter {
        &self.writer
    }

    /// Resolve the profile's codecs and open `path`.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.writer.open_video_codec(&self.profile.video_codec)?;
        self.writer.open_audio_codec(&self.profile.audio_codec)?;
        self.writer.open_output_file(path)?;
        log::info!("Recording to {}", path.display());
        Ok(())
    }

    pub fn process_video(&mut self, sample: &VideoSample<'_>) -> Result<()> {
        if !self.writer.check_if_video_sample_is_valid(sample) {
            log::warn!(
                "Dropping malformed {}x{} video sample",
                sample.width,
                sample.height
            );
            self.stats.dropped += 1;
            return Ok(());
        }
        if !self.output_started {
            self.start_streams(sample.width, sample.height)?;
        }

        let Some(pts) = self.clock.video_pts(sample.pts) else {
            log::debug!("Dropping video sample at {:.3}s, no new frame", sample.pts.seconds());
            self.stats.dropped += 1;
            return Ok(());
        };
        let frame_time = MediaTime::new(pts, self.profile.frame_rate as i32);
        self.writer
            .write_video(VIDEO_SLOT, &sample.with_pts(frame_time))?;
        self.stats.video_frames += 1;
        Ok(())
    }

    pub fn process_screen_audio(
        &mut self,
        buffers: &AudioBufferList<'_>,
        format: &AudioFormatDescriptor,
        captured_at: MediaTime,
    ) -> Result<()> {
        let pts = if self.output_started {
            self.clock.screen_audio_pts(captured_at)
        } else {
            None
        };
        let Some(pts) = pts else {
            self.stats.dropped += 1;
            return Ok(());
        };
        self.writer
            .write_audio(SCREEN_AUDIO_SLOT, buffers, format, pts)?;
        self.stats.screen_audio_buffers += 1;
        Ok(())
    }

    pub fn process_mic_audio(
        &mut self,
        buffers: &AudioBufferList<'_>,
        format: &AudioFormatDescriptor,
        captured_at: MediaTime,
    ) -> Result<()> {
        if self.profile.microphone.is_none() {
            return Ok(());
        }
        let pts = if self.output_started {
            self.clock.mic_audio_pts(captured_at)
        } else {
            None
        };
        let Some(pts) = pts else {
            self.stats.dropped += 1;
            return Ok(());
        };
        self.writer
            .write_audio(MIC_AUDIO_SLOT, buffers, format, pts)?;
        self.stats.mic_audio_buffers += 1;
        Ok(())
    }

    /// Finish every stream and the file, then release everything. Resources
    /// are released even when finishing fails.
    pub fn stop(mut self) -> Result<SessionStats> {
        let result = self.finish();
        self.writer.free_output();
        result.map(|()| self.stats)
    }

    fn finish(&mut self) -> Result<()> {
        if !self.output_started {
            log::warn!("Recording stopped before any video arrived, nothing was written");
            return Ok(());
        }
        let mut first_error: Option<WriterError> = None;
        for slot in self.profile.slots() {
            if let Err(e) = self.writer.finish_stream(slot) {
                log::warn!("Stream {slot}: {e}");
                first_error.get_or_insert(e);
                self.writer.free_stream(slot)?;
            }
        }
        let finished = self.writer.finish_output();
        log::info!(
            "Recording finished: {} video frame(s), {} screen and {} mic audio buffer(s), {} dropped",
            self.stats.video_frames,
            self.stats.screen_audio_buffers,
            self.stats.mic_audio_buffers,
            self.stats.dropped
        );
        match first_error {
            Some(e) => Err(e),
            None => finished,
        }
    }

    /// Create, open and start every stream. On failure every slot is freed
    /// again so the next frame retries from scratch.
    fn start_streams(&mut self, width: u32, height: u32) -> Result<()> {
        let result = self.create_streams(width, height);
        if let Err(e) = &result {
            log::warn!("Starting the streams failed: {e}");
            for slot in self.profile.slots() {
                if let Err(free_error) = self.writer.free_stream(slot) {
                    log::warn!("Stream {slot}: {free_error}");
                }
            }
        }
        result
    }

    /// Odd capture sizes are rounded down to even; the extra row or column
    /// is cropped.
    fn create_streams(&mut self, width: u32, height: u32) -> Result<()> {
        let width = (width & !1) as i32;
        let height = (height & !1) as i32;
        let profile = &self.profile;
        let screen = profile.screen_audio.stream_config()?;

        self.writer.add_video_stream(
            VIDEO_SLOT,
            width,
            height,
            profile.frame_rate as i32,
            profile.video_bit_rate as i64,
        )?;
        self.writer.add_audio_stream(
            SCREEN_AUDIO_SLOT,
            screen.sample_rate as i32,
            screen.bit_rate as i64,
        )?;
        if let Some(mic) = &profile.microphone {
            let mic = mic.stream_config()?;
            self.writer
                .add_audio_stream(MIC_AUDIO_SLOT, mic.sample_rate as i32, mic.bit_rate as i64)?;
        }

        self.writer.open_video(VIDEO_SLOT)?;
        self.writer.open_audio(SCREEN_AUDIO_SLOT)?;
        if profile.microphone.is_some() {
            self.writer.open_audio(MIC_AUDIO_SLOT)?;
        }
        self.writer.start_output()?;
        self.output_started = true;
        log::info!(
            "Started {width}x{height} @ {} fps with {} audio stream(s)",
            profile.frame_rate,
            profile.slots().len() - 1
        );
        Ok(())
    }
}
