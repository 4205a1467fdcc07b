use crate::video::domain::plane_copy::{copy_plane, split_interleaved_chroma};
use crate::video::domain::video_sample::VideoSample;

const BLACK_LUMA: u8 = 16;
const NEUTRAL_CHROMA: u8 = 128;

/// Pixel layouts the encoders accept from this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePixelFormat {
    /// Luma plane followed by one interleaved `UV` plane.
    Nv12,
    /// Luma, U and V in three separate planes.
    Yuv420p,
}

impl FramePixelFormat {
    pub fn plane_count(self) -> usize {
        match self {
            FramePixelFormat::Nv12 => 2,
            FramePixelFormat::Yuv420p => 3,
        }
    }
}

/// The reusable picture a video stream hands to its encoder.
///
/// Planes are tightly packed (stride equals row width). Every `write_video`
/// overwrites the visible area; nothing is carried between calls except the
/// allocation.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    format: FramePixelFormat,
    width: u32,
    height: u32,
    planes: Vec<Vec<u8>>,
}

impl VideoFrame {
    pub fn new(format: FramePixelFormat, width: u32, height: u32) -> Self {
        let mut frame = Self {
            format,
            width,
            height,
            planes: Vec::with_capacity(format.plane_count()),
        };
        for plane in 0..format.plane_count() {
            let fill = if plane == 0 { BLACK_LUMA } else { NEUTRAL_CHROMA };
            let len = frame.stride(plane) * frame.plane_height(plane);
            frame.planes.push(vec![fill; len]);
        }
        frame
    }

    pub fn format(&self) -> FramePixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Bytes per row of `plane`.
    pub fn stride(&self, plane: usize) -> usize {
        let chroma_width = (self.width as usize).div_ceil(2);
        match (self.format, plane) {
            (_, 0) => self.width as usize,
            (FramePixelFormat::Nv12, _) => chroma_width * 2,
            (FramePixelFormat::Yuv420p, _) => chroma_width,
        }
    }

    pub fn plane_height(&self, plane: usize) -> usize {
        if plane == 0 {
            self.height as usize
        } else {
            (self.height as usize).div_ceil(2)
        }
    }

    pub fn plane(&self, plane: usize) -> &[u8] {
        &self.planes[plane]
    }

    /// Copy the visible area of `sample` into this frame.
    ///
    /// Rows and columns beyond the frame size are cropped; if the sample is
    /// smaller than the frame the uncovered area keeps its previous content.
    pub fn fill_from_sample(&mut self, sample: &VideoSample<'_>) {
        let width = self.width.min(sample.width) as usize;
        let height = self.height.min(sample.height) as usize;
        let luma_stride = self.stride(0);
        let chroma_stride = self.stride(1);
        let chroma_rows = height.div_ceil(2);
        let pairs = width.div_ceil(2);

        copy_plane(
            sample.luma,
            sample.luma_stride,
            &mut self.planes[0],
            luma_stride,
            width,
            height,
        );

        match self.format {
            FramePixelFormat::Nv12 => copy_plane(
                sample.chroma,
                sample.chroma_stride,
                &mut self.planes[1],
                chroma_stride,
                pairs * 2,
                chroma_rows,
            ),
            FramePixelFormat::Yuv420p => {
                let (_, chroma) = self.planes.split_at_mut(1);
                let (u, v) = chroma.split_at_mut(1);
                split_interleaved_chroma(
                    sample.chroma,
                    sample.chroma_stride,
                    &mut u[0],
                    chroma_stride,
                    &mut v[0],
                    chroma_stride,
                    pairs,
                    chroma_rows,
                );
            }
        }
    }
}
