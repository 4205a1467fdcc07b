use crate::shared::media_time::MediaTime;

/// A captured biplanar 4:2:0 (NV12) picture borrowed from the capture source.
///
/// Strides may exceed the visible width; only the first `width` bytes of
/// each luma row (and `width` rounded up to even of each chroma row) carry
/// picture data.
#[derive(Debug, Clone, Copy)]
pub struct VideoSample<'a> {
    pub width: u32,
    pub height: u32,
    pub luma: &'a [u8],
    pub luma_stride: usize,
    pub chroma: &'a [u8],
    pub chroma_stride: usize,
    pub pts: MediaTime,
}

impl<'a> VideoSample<'a> {
    pub fn with_pts(self, pts: MediaTime) -> Self {
        Self { pts, ..self }
    }

    pub fn chroma_rows(&self) -> usize {
        (self.height as usize).div_ceil(2)
    }

    pub fn chroma_row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(2) * 2
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "empty picture ({}x{})",
                self.width, self.height
            ));
        }
        if self.luma.is_empty() || self.chroma.is_empty() {
            return Err("missing luma or chroma plane".to_string());
        }
        if !self.pts.is_valid() {
            return Err(format!(
                "invalid presentation timestamp (timescale {})",
                self.pts.timescale
            ));
        }

        let width = self.width as usize;
        let height = self.height as usize;
        check_plane("luma", self.luma.len(), self.luma_stride, width, height)?;
        check_plane(
            "chroma",
            self.chroma.len(),
            self.chroma_stride,
            self.chroma_row_bytes(),
            self.chroma_rows(),
        )
    }
}

/// True when `sample` can be handed to `write_video`.
pub fn check_if_video_sample_is_valid(sample: &VideoSample<'_>) -> bool {
    sample.validate().is_ok()
}

fn check_plane(
    name: &str,
    len: usize,
    stride: usize,
    row_bytes: usize,
    rows: usize,
) -> Result<(), String> {
    if stride < row_bytes {
        return Err(format!(
            "{name} stride {stride} is narrower than {row_bytes} bytes per row"
        ));
    }
    let needed = stride.saturating_mul(rows - 1).saturating_add(row_bytes);
    if len < needed {
        return Err(format!(
            "{name} plane holds {len} bytes, {needed} needed"
        ));
    }
    Ok(())
}
