use crate::audio::domain::format_descriptor::AudioFormatDescriptor;

/// Raw PCM frames in a fixed format, one byte vector per plane.
///
/// A buffer is either bounded (encoder frames, converter scratch) or
/// unbounded (input queues). Appends to a bounded buffer stop at capacity
/// and report how many frames actually fit.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    format: AudioFormatDescriptor,
    planes: Vec<Vec<u8>>,
    frames: usize,
    capacity: usize,
}

impl SampleBuffer {
    pub fn with_capacity(format: AudioFormatDescriptor, capacity: usize) -> Self {
        let bytes = capacity.saturating_mul(format.bytes_per_frame());
        Self {
            format,
            planes: (0..format.plane_count())
                .map(|_| Vec::with_capacity(bytes))
                .collect(),
            frames: 0,
            capacity,
        }
    }

    pub fn unbounded(format: AudioFormatDescriptor) -> Self {
        Self {
            format,
            planes: vec![Vec::new(); format.plane_count()],
            frames: 0,
            capacity: usize::MAX,
        }
    }

    pub fn format(&self) -> &AudioFormatDescriptor {
        &self.format
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn is_full(&self) -> bool {
        self.frames >= self.capacity
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// The filled bytes of `plane`.
    pub fn plane(&self, plane: usize) -> &[u8] {
        &self.planes[plane]
    }

    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.clear();
        }
        self.frames = 0;
    }

    /// Append up to `frames` frames taken from the start of each source plane.
    ///
    /// `planes` must hold one slice per plane with at least
    /// `frames * bytes_per_frame` bytes each. Returns the frames appended.
    pub fn append_planes(&mut self, planes: &[&[u8]], frames: usize) -> usize {
        let count = frames.min(self.remaining());
        if count == 0 || planes.len() != self.planes.len() {
            return 0;
        }
        let bytes = count * self.format.bytes_per_frame();
        if planes.iter().any(|p| p.len() < bytes) {
            return 0;
        }
        for (dst, src) in self.planes.iter_mut().zip(planes) {
            dst.extend_from_slice(&src[..bytes]);
        }
        self.frames += count;
        count
    }

    /// Append frames `offset..offset + frames` of `self` to `dst`.
    ///
    /// Both buffers must share a format. Returns the frames appended.
    pub fn copy_into(&self, offset: usize, frames: usize, dst: &mut SampleBuffer) -> usize {
        if offset >= self.frames || dst.format != self.format {
            return 0;
        }
        let frames = frames.min(self.frames - offset);
        let bpf = self.format.bytes_per_frame();
        let start = offset * bpf;
        let end = start + frames * bpf;
        let slices: Vec<&[u8]> = self.planes.iter().map(|p| &p[start..end]).collect();
        dst.append_planes(&slices, frames)
    }

    /// Drop the first `frames` frames, shifting the rest to the front.
    pub fn discard_front(&mut self, frames: usize) {
        let frames = frames.min(self.frames);
        let bytes = frames * self.format.bytes_per_frame();
        for plane in &mut self.planes {
            plane.drain(..bytes);
        }
        self.frames -= frames;
    }

    /// Move as many frames as fit from the front of `self` into `dst`.
    pub fn move_into(&mut self, dst: &mut SampleBuffer) -> usize {
        let moved = self.copy_into(0, dst.remaining(), dst);
        self.discard_front(moved);
        moved
    }

    /// Reverse the byte order of every sample in place.
    pub fn swap_byte_order(&mut self) {
        let width = self.format.sample_format.bytes();
        if width < 2 {
            return;
        }
        for plane in &mut self.planes {
            for sample in plane.chunks_exact_mut(width) {
                sample.reverse();
            }
        }
    }

    /// Append `frames` frames of silence (all-zero samples).
    pub fn append_silence(&mut self, frames: usize) -> usize {
        let count = frames.min(self.remaining());
        let bytes = count * self.format.bytes_per_frame();
        for plane in &mut self.planes {
            plane.resize(plane.len() + bytes, 0);
        }
        self.frames += count;
        count
    }
}
