use std::path::Path;

use crate::codec::domain::codec_handle::CodecHandle;
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::stream_parameters::StreamParameters;
use crate::shared::error::BackendError;

/// An open output file in some container format.
///
/// Streams are added and configured right before the header is written;
/// packets arrive afterwards, timestamped in their encoder's time base.
pub trait ContainerSink: Send {
    /// Whether the format wants codec headers out of band.
    fn requires_global_header(&self) -> bool;

    /// Add a stream for `codec` and return its container index.
    fn add_stream(&mut self, codec: &CodecHandle) -> Result<usize, BackendError>;

    /// Publish an opened encoder's parameters on stream `index`.
    fn configure_stream(
        &mut self,
        index: usize,
        parameters: &StreamParameters,
    ) -> Result<(), BackendError>;

    fn write_header(&mut self) -> Result<(), BackendError>;

    /// Interleave and write one packet on container stream `index`.
    fn write_packet(&mut self, index: usize, packet: &EncodedPacket) -> Result<(), BackendError>;

    fn write_trailer(&mut self) -> Result<(), BackendError>;
}

/// Creates output files.
pub trait ContainerFactory: Send {
    fn create(&self, path: &Path) -> Result<Box<dyn ContainerSink>, BackendError>;
}
