use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    F32,
    F64,
}

impl SampleFormat {
    pub fn bytes(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
            SampleFormat::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleLayout {
    /// All channels share one buffer, frame by frame.
    Interleaved,
    /// One buffer per channel.
    Planar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Describes raw PCM: rate, channel count and sample representation.
///
/// Two descriptors compare equal only when every field matches; converters
/// are cached against this equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormatDescriptor {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub layout: SampleLayout,
    pub byte_order: ByteOrder,
}

impl AudioFormatDescriptor {
    /// Interleaved, native-endian PCM.
    pub fn interleaved(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
            layout: SampleLayout::Interleaved,
            byte_order: ByteOrder::native(),
        }
    }

    /// Planar, native-endian PCM.
    pub fn planar(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            layout: SampleLayout::Planar,
            ..Self::interleaved(sample_rate, channels, sample_format)
        }
    }

    pub fn with_byte_order(self, byte_order: ByteOrder) -> Self {
        Self { byte_order, ..self }
    }

    pub fn plane_count(&self) -> usize {
        match self.layout {
            SampleLayout::Interleaved => 1,
            SampleLayout::Planar => self.channels as usize,
        }
    }

    /// Bytes one frame occupies in each plane.
    pub fn bytes_per_frame(&self) -> usize {
        match self.layout {
            SampleLayout::Interleaved => self.sample_format.bytes() * self.channels as usize,
            SampleLayout::Planar => self.sample_format.bytes(),
        }
    }

    pub fn is_native_endian(&self) -> bool {
        self.byte_order == ByteOrder::native() || self.sample_format.bytes() == 1
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".to_string());
        }
        if self.channels == 0 {
            return Err("channel count must be positive".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for AudioFormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz {}ch {:?} {:?} {:?}-endian",
            self.sample_rate, self.channels, self.sample_format, self.layout, self.byte_order
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::interleaved_s16_stereo(AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16), 1, 4)]
    #[case::planar_f32_stereo(AudioFormatDescriptor::planar(48000, 2, SampleFormat::F32), 2, 4)]
    #[case::interleaved_f64_mono(AudioFormatDescriptor::interleaved(8000, 1, SampleFormat::F64), 1, 8)]
    fn test_geometry(
        #[case] format: AudioFormatDescriptor,
        #[case] planes: usize,
        #[case] bytes_per_frame: usize,
    ) {
        assert_eq!(format.plane_count(), planes);
        assert_eq!(format.bytes_per_frame(), bytes_per_frame);
    }

    #[test]
    fn test_byte_order_participates_in_equality() {
        let le = AudioFormatDescriptor::interleaved(48000, 1, SampleFormat::F32)
            .with_byte_order(ByteOrder::Little);
        let be = le.with_byte_order(ByteOrder::Big);
        assert_ne!(le, be);
    }

    #[test]
    fn test_single_byte_samples_are_always_native() {
        let format = AudioFormatDescriptor::interleaved(8000, 1, SampleFormat::U8)
            .with_byte_order(ByteOrder::Big);
        assert!(format.is_native_endian());
    }

    #[rstest]
    #[case::zero_rate(AudioFormatDescriptor::interleaved(0, 2, SampleFormat::S16))]
    #[case::zero_channels(AudioFormatDescriptor::interleaved(44100, 0, SampleFormat::S16))]
    fn test_validate_rejects(#[case] format: AudioFormatDescriptor) {
        assert!(format.validate().is_err());
    }
}
