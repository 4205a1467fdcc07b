use crate::audio::domain::audio_buffer_list::AudioBufferList;
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;

/// Input PCM waiting to be pulled by a converter.
///
/// Frames are handed out front to back; whatever a converter does not pull
/// stays queued for the next pull.
#[derive(Debug, Clone)]
pub struct InputQueue {
    samples: SampleBuffer,
    cursor: usize,
}

impl InputQueue {
    pub fn new(format: AudioFormatDescriptor) -> Self {
        Self {
            samples: SampleBuffer::unbounded(format),
            cursor: 0,
        }
    }

    pub fn format(&self) -> &AudioFormatDescriptor {
        self.samples.format()
    }

    /// Frames queued and not yet pulled.
    pub fn available(&self) -> usize {
        self.samples.frames() - self.cursor
    }

    /// Queue `frames` frames from `buffers`, which must be in this queue's format.
    pub fn push(&mut self, buffers: &AudioBufferList<'_>, frames: usize) -> usize {
        if self.cursor > 0 {
            self.samples.discard_front(self.cursor);
            self.cursor = 0;
        }
        self.samples.append_planes(buffers.buffers(), frames)
    }

    /// Supply up to `requested` frames to `fill` and return how many were
    /// supplied. Fewer than requested means the queue ran dry; that is a
    /// partial fill, not an error.
    pub fn resample_audio_frame(&mut self, requested: usize, fill: &mut SampleBuffer) -> usize {
        let count = requested.min(self.available()).min(fill.remaining());
        let supplied = self.samples.copy_into(self.cursor, count, fill);
        self.cursor += supplied;
        if self.cursor == self.samples.frames() {
            self.samples.clear();
            self.cursor = 0;
        }
        supplied
    }
}
