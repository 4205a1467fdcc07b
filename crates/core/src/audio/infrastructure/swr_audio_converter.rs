use ffmpeg_next::software::resampling;
use ffmpeg_next::util::frame::audio::Audio;

use crate::audio::domain::audio_converter::{AudioConverter, AudioConverterFactory, InputSupplier};
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::shared::constants::CONVERTER_PULL_FRAMES;
use crate::shared::error::BackendError;
use crate::shared::ffmpeg_support::{channel_layout, sample_format};

/// Headroom on top of the rate-scaled output size, so one pull never
/// leaves converted frames stranded inside libswresample.
const OUTPUT_HEADROOM: usize = 256;

/// Rate, layout, channel count and byte order conversion through
/// libswresample.
///
/// Input is pulled from the supplier in chunks of at most
/// [`CONVERTER_PULL_FRAMES`]; converted frames that do not fit the caller's
/// buffer wait in `pending` for the next call.
pub struct SwrAudioConverter {
    context: resampling::Context,
    input_format: AudioFormatDescriptor,
    output_format: AudioFormatDescriptor,
    scratch: SampleBuffer,
    pending: SampleBuffer,
    input_frame: Audio,
    output_frame: Audio,
    output_capacity: usize,
}

// Safety: the resampler is owned by one stream's converter and is only
// driven from whichever thread currently holds the writer.
unsafe impl Send for SwrAudioConverter {}

impl SwrAudioConverter {
    pub fn new(
        input: &AudioFormatDescriptor,
        output: &AudioFormatDescriptor,
    ) -> Result<Self, BackendError> {
        input.validate().map_err(BackendError::new)?;
        output.validate().map_err(BackendError::new)?;
        let in_layout = channel_layout(input.channels)?;
        let out_layout = channel_layout(output.channels)?;

        let context = resampling::Context::get(
            sample_format(input),
            in_layout,
            input.sample_rate,
            sample_format(output),
            out_layout,
            output.sample_rate,
        )?;

        let scaled = CONVERTER_PULL_FRAMES as u64 * output.sample_rate as u64
            / input.sample_rate as u64;
        let output_capacity = scaled as usize + OUTPUT_HEADROOM;

        let mut input_frame = Audio::new(sample_format(input), CONVERTER_PULL_FRAMES, in_layout);
        input_frame.set_rate(input.sample_rate);
        let mut output_frame = Audio::new(sample_format(output), output_capacity, out_layout);
        output_frame.set_rate(output.sample_rate);

        Ok(Self {
            context,
            input_format: *input,
            output_format: *output,
            scratch: SampleBuffer::with_capacity(*input, CONVERTER_PULL_FRAMES),
            pending: SampleBuffer::unbounded(*output),
            input_frame,
            output_frame,
            output_capacity,
        })
    }

    fn load_input(&mut self, frames: usize) {
        if !self.input_format.is_native_endian() {
            self.scratch.swap_byte_order();
        }
        self.input_frame.set_samples(frames);
        let bytes = frames * self.input_format.bytes_per_frame();
        for plane in 0..self.scratch.plane_count() {
            self.input_frame.data_mut(plane)[..bytes]
                .copy_from_slice(&self.scratch.plane(plane)[..bytes]);
        }
    }

    /// Move whatever the last run produced into `pending`.
    fn collect_output(&mut self) -> usize {
        let produced = self.output_frame.samples();
        if produced == 0 {
            return 0;
        }
        let bytes = produced * self.output_format.bytes_per_frame();
        let planes: Vec<&[u8]> = (0..self.pending.plane_count())
            .map(|plane| &self.output_frame.data(plane)[..bytes])
            .collect();
        self.pending.append_planes(&planes, produced)
    }
}

impl AudioConverter for SwrAudioConverter {
    fn input_format(&self) -> &AudioFormatDescriptor {
        &self.input_format
    }

    fn output_format(&self) -> &AudioFormatDescriptor {
        &self.output_format
    }

    fn convert(
        &mut self,
        output: &mut SampleBuffer,
        supply: &mut InputSupplier<'_>,
    ) -> Result<usize, BackendError> {
        let start = output.frames();
        loop {
            self.pending.move_into(output);
            if output.is_full() {
                break;
            }

            self.scratch.clear();
            let got = supply(CONVERTER_PULL_FRAMES, &mut self.scratch);
            if got == 0 {
                break;
            }

            self.load_input(got);
            self.output_frame.set_samples(self.output_capacity);
            self.context.run(&self.input_frame, &mut self.output_frame)?;
            self.collect_output();
        }
        Ok(output.frames() - start)
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        loop {
            self.output_frame.set_samples(self.output_capacity);
            self.context.flush(&mut self.output_frame)?;
            if self.collect_output() == 0 {
                return Ok(());
            }
        }
    }

    fn buffered_frames(&self) -> usize {
        let delayed = self
            .context
            .delay()
            .map_or(0, |delay| delay.output.max(0) as usize);
        self.pending.frames() + delayed
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SwrAudioConverterFactory;

impl SwrAudioConverterFactory {
    pub fn new() -> Self {
        Self
    }
}

impl AudioConverterFactory for SwrAudioConverterFactory {
    fn build(
        &self,
        input: &AudioFormatDescriptor,
        output: &AudioFormatDescriptor,
    ) -> Result<Box<dyn AudioConverter>, BackendError> {
        Ok(Box::new(SwrAudioConverter::new(input, output)?))
    }
}
