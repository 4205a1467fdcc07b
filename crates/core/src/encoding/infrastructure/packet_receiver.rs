use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::shared::error::BackendError;
use crate::shared::ffmpeg_support::is_again;
use crate::shared::media_time::Rational;

/// Pull one packet out of `encoder` into `out`, reusing `scratch`.
pub(super) fn receive_into(
    encoder: &mut ffmpeg_next::encoder::Encoder,
    scratch: &mut ffmpeg_next::Packet,
    time_base: Rational,
    out: &mut EncodedPacket,
) -> Result<bool, BackendError> {
    match encoder.receive_packet(scratch) {
        Ok(()) => {
            out.clear();
            if let Some(data) = scratch.data() {
                out.data.extend_from_slice(data);
            }
            out.pts = scratch.pts();
            out.dts = scratch.dts();
            out.duration = scratch.duration();
            out.is_keyframe = scratch.is_key();
            out.time_base = time_base;
            Ok(true)
        }
        Err(ffmpeg_next::Error::Eof) => Ok(false),
        Err(e) if is_again(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Copy the encoder's global header, if it produced one.
pub(super) fn extradata(encoder: &ffmpeg_next::encoder::Encoder) -> Vec<u8> {
    unsafe {
        let ctx = encoder.as_ptr();
        if (*ctx).extradata_size > 0 && !(*ctx).extradata.is_null() {
            std::slice::from_raw_parts((*ctx).extradata, (*ctx).extradata_size as usize).to_vec()
        } else {
            Vec::new()
        }
    }
}

/// Make `frame`'s buffers safe to overwrite while the encoder may still
/// hold a reference to the previous contents.
pub(super) fn make_writable(frame: &mut ffmpeg_next::Frame) -> Result<(), BackendError> {
    let ret = unsafe { ffmpeg_next::ffi::av_frame_make_writable(frame.as_mut_ptr()) };
    if ret < 0 {
        return Err(ffmpeg_next::Error::from(ret).into());
    }
    Ok(())
}
