use crate::container::domain::container_muxer::ContainerMuxer;
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::encoder::Encoder;
use crate::shared::error::{Result, WriterError};
use crate::shared::slot::Slot;
use crate::stream::stream_state::StreamStats;

/// Move every packet the encoder has ready into the container.
///
/// Returns the number of packets written. Encoder failures come back as
/// [`WriterError::EncodeFailed`], container failures as whatever the muxer
/// reports.
pub fn pump_packets<E: Encoder + ?Sized>(
    encoder: &mut E,
    packet: &mut EncodedPacket,
    stream_index: usize,
    muxer: &mut ContainerMuxer,
    stats: &mut StreamStats,
    slot: Slot,
) -> Result<usize> {
    let mut written = 0;
    loop {
        let ready = encoder
            .receive_packet(packet)
            .map_err(|source| WriterError::EncodeFailed {
                slot: slot.index(),
                source,
            })?;
        if !ready {
            return Ok(written);
        }

        packet.stream_index = stream_index;
        muxer.write_packet(packet)?;
        stats.packets_written += 1;
        stats.bytes_written += packet.data.len() as u64;
        if packet.pts.is_some() {
            stats.last_packet_pts = packet.pts;
        }
        written += 1;
    }
}
