use crate::audio::domain::audio_converter::{AudioConverter, AudioConverterFactory, InputSupplier};
use crate::audio::domain::format_descriptor::AudioFormatDescriptor;
use crate::audio::domain::sample_buffer::SampleBuffer;
use crate::shared::error::BackendError;

/// What [`FormatConverter::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The cached converter already matched the input format.
    Reused,
    /// A converter was (re)built for a new input format.
    Built,
}

/// Lazily builds the converter from capture format to encoder format and
/// rebuilds it only when the input format changes.
///
/// The cache key is the input format of the converter currently held. A
/// failed build leaves no converter and so no key, and the next call retries.
pub struct FormatConverter {
    output_format: AudioFormatDescriptor,
    converter: Option<Box<dyn AudioConverter>>,
    generation: u64,
}

impl FormatConverter {
    pub fn new(output_format: AudioFormatDescriptor) -> Self {
        Self {
            output_format,
            converter: None,
            generation: 0,
        }
    }

    pub fn output_format(&self) -> &AudioFormatDescriptor {
        &self.output_format
    }

    pub fn input_format(&self) -> Option<&AudioFormatDescriptor> {
        self.converter.as_ref().map(|converter| converter.input_format())
    }

    /// Number of converters built so far. Changes exactly when a rebuild happens.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.converter.is_some()
    }

    pub fn ensure(
        &mut self,
        factory: &dyn AudioConverterFactory,
        input: &AudioFormatDescriptor,
    ) -> Result<EnsureOutcome, BackendError> {
        if self.input_format() == Some(input) {
            return Ok(EnsureOutcome::Reused);
        }

        self.reset();
        let converter = factory.build(input, &self.output_format)?;
        if *converter.output_format() != self.output_format {
            return Err(BackendError::new(format!(
                "converter produces {}, the encoder wants {}",
                converter.output_format(),
                self.output_format
            )));
        }
        self.converter = Some(converter);
        self.generation += 1;
        log::debug!(
            "Built audio converter #{}: {input} -> {}",
            self.generation,
            self.output_format
        );
        Ok(EnsureOutcome::Built)
    }

    pub fn convert(
        &mut self,
        output: &mut SampleBuffer,
        supply: &mut InputSupplier<'_>,
    ) -> Result<usize, BackendError> {
        self.active()?.convert(output, supply)
    }

    pub fn flush(&mut self) -> Result<(), BackendError> {
        match self.converter.as_mut() {
            Some(converter) => converter.flush(),
            None => Ok(()),
        }
    }

    pub fn buffered_frames(&self) -> usize {
        self.converter
            .as_ref()
            .map_or(0, |converter| converter.buffered_frames())
    }

    /// Drop the converter, and with it the cached input format.
    pub fn reset(&mut self) {
        self.converter = None;
    }

    fn active(&mut self) -> Result<&mut Box<dyn AudioConverter>, BackendError> {
        self.converter
            .as_mut()
            .ok_or_else(|| BackendError::new("no audio converter has been built"))
    }
}
