use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::shared::error::BackendError;

/// Pull callback a converter uses to request input.
///
/// Called with the number of frames wanted and a buffer in the converter's
/// input format; returns how many frames it appended. Returning fewer than
/// requested (including zero) means no more input is available right now.
pub type InputSupplier<'a> = dyn FnMut(usize, &mut SampleBuffer) -> usize + 'a;

/// Converts PCM from one fixed format to another, pulling input on demand.
pub trait AudioConverter: Send {
    fn input_format(&self) -> &AudioFormatDescriptor;

    fn output_format(&self) -> &AudioFormatDescriptor;

    /// Append converted frames to `output` until it is full or `supply`
    /// runs dry. Returns the frames appended.
    fn convert(
        &mut self,
        output: &mut SampleBuffer,
        supply: &mut InputSupplier<'_>,
    ) -> Result<usize, BackendError>;

    /// Push everything still held inside the converter to its output side,
    /// so the next `convert` calls can hand it out.
    fn flush(&mut self) -> Result<(), BackendError>;

    /// Output frames produced from input already pulled but not yet handed out.
    fn buffered_frames(&self) -> usize {
        0
    }
}

pub trait AudioConverterFactory: Send {
    fn build(
        &self,
        input: &AudioFormatDescriptor,
        output: &AudioFormatDescriptor,
    ) -> Result<Box<dyn AudioConverter>, BackendError>;
}
