use crate::audio::domain::format_descriptor::AudioFormatDescriptor;

/// Borrowed input PCM as delivered by the capture source: one buffer for
/// interleaved audio, one per channel for planar audio.
#[derive(Debug, Clone)]
pub struct AudioBufferList<'a> {
    buffers: Vec<&'a [u8]>,
}

impl<'a> AudioBufferList<'a> {
    pub fn new(buffers: Vec<&'a [u8]>) -> Self {
        Self { buffers }
    }

    pub fn single(buffer: &'a [u8]) -> Self {
        Self {
            buffers: vec![buffer],
        }
    }

    pub fn buffers(&self) -> &[&'a [u8]] {
        &self.buffers
    }

    /// Number of frames the list carries when read as `format`.
    ///
    /// Fails when the buffer count does not match the format's plane count,
    /// a buffer is not a whole number of frames, or planes disagree in length.
    pub fn frame_count(&self, format: &AudioFormatDescriptor) -> Result<usize, String> {
        if self.buffers.len() != format.plane_count() {
            return Err(format!(
                "expected {} buffers for {format}, got {}",
                format.plane_count(),
                self.buffers.len()
            ));
        }
        let bpf = format.bytes_per_frame();
        let mut frames = None;
        for (i, buffer) in self.buffers.iter().enumerate() {
            if buffer.len() % bpf != 0 {
                return Err(format!(
                    "buffer {i} holds {} bytes, not a multiple of {bpf}",
                    buffer.len()
                ));
            }
            let n = buffer.len() / bpf;
            match frames {
                None => frames = Some(n),
                Some(expected) if expected != n => {
                    return Err(format!(
                        "buffer {i} holds {n} frames, buffer 0 holds {expected}"
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(frames.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::format_descriptor::SampleFormat;

    #[test]
    fn test_interleaved_frame_count() {
        let data = [0u8; 16];
        let format = AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16);
        assert_eq!(AudioBufferList::single(&data).frame_count(&format), Ok(4));
    }

    #[test]
    fn test_planar_frame_count() {
        let left = [0u8; 8];
        let right = [0u8; 8];
        let format = AudioFormatDescriptor::planar(48000, 2, SampleFormat::F32);
        let list = AudioBufferList::new(vec![&left[..], &right[..]]);
        assert_eq!(list.frame_count(&format), Ok(2));
    }

    #[test]
    fn test_rejects_partial_frame() {
        let data = [0u8; 6];
        let format = AudioFormatDescriptor::interleaved(44100, 2, SampleFormat::S16);
        assert!(AudioBufferList::single(&data).frame_count(&format).is_err());
    }

    #[test]
    fn test_rejects_wrong_buffer_count() {
        let data = [0u8; 8];
        let format = AudioFormatDescriptor::planar(48000, 2, SampleFormat::F32);
        assert!(AudioBufferList::single(&data).frame_count(&format).is_err());
    }

    #[test]
    fn test_rejects_mismatched_planes() {
        let left = [0u8; 8];
        let right = [0u8; 4];
        let format = AudioFormatDescriptor::planar(48000, 2, SampleFormat::F32);
        let list = AudioBufferList::new(vec![&left[..], &right[..]]);
        assert!(list.frame_count(&format).is_err());
    }
}
