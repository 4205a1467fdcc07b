//! Strided plane copies between capture buffers and encoder frames.
//!
//! Capture buffers and encoder frames rarely agree on row padding, so every
//! copy works row by row unless both sides share a stride. Copies are clamped
//! to what both buffers can hold and never panic on short input.

/// Copy `rows` rows of `row_bytes` bytes from `src` to `dst`.
///
/// When both planes share a stride the rows are contiguous and the copy is a
/// single `copy_from_slice`.
pub fn copy_plane(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    row_bytes: usize,
    rows: usize,
) {
    let row_bytes = row_bytes.min(src_stride).min(dst_stride);
    if row_bytes == 0 {
        return;
    }
    let rows = rows
        .min(rows_available(src.len(), src_stride, row_bytes))
        .min(rows_available(dst.len(), dst_stride, row_bytes));
    if rows == 0 {
        return;
    }

    if src_stride == dst_stride {
        let len = src_stride * (rows - 1) + row_bytes;
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    for row in 0..rows {
        let s = row * src_stride;
        let d = row * dst_stride;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

/// De-interleave a biplanar `UVUV...` chroma plane into separate U and V planes.
///
/// `pairs` is the number of U/V pairs per row.
pub fn split_interleaved_chroma(
    src: &[u8],
    src_stride: usize,
    u: &mut [u8],
    u_stride: usize,
    v: &mut [u8],
    v_stride: usize,
    pairs: usize,
    rows: usize,
) {
    for row in 0..rows {
        let s = row * src_stride;
        let Some(src_row) = src.get(s..s + pairs * 2) else {
            break;
        };
        let u_start = row * u_stride;
        let v_start = row * v_stride;
        let (Some(u_row), Some(v_row)) = (
            u.get_mut(u_start..u_start + pairs),
            v.get_mut(v_start..v_start + pairs),
        ) else {
            break;
        };
        for (i, pair) in src_row.chunks_exact(2).enumerate() {
            u_row[i] = pair[0];
            v_row[i] = pair[1];
        }
    }
}

fn rows_available(len: usize, stride: usize, row_bytes: usize) -> usize {
    if len < row_bytes {
        0
    } else {
        (len - row_bytes) / stride + 1
    }
}
