use std::fmt;
use std::path::{Path, PathBuf};

use crate::codec::domain::codec_handle::CodecHandle;
use crate::container::domain::container_sink::{ContainerFactory, ContainerSink};
use crate::encoding::domain::encoded_packet::EncodedPacket;
use crate::encoding::domain::stream_parameters::StreamParameters;
use crate::shared::error::{BackendError, Result, WriterError};

/// Where the output file is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPhase {
    Closed,
    Open,
    HeaderWritten,
    TrailerWritten,
    Freed,
}

impl fmt::Display for OutputPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputPhase::Closed => "closed",
            OutputPhase::Open => "open",
            OutputPhase::HeaderWritten => "writing",
            OutputPhase::TrailerWritten => "finished",
            OutputPhase::Freed => "freed",
        };
        f.write_str(name)
    }
}

/// A stream added to the output. The sink only sees it when the header is
/// written, so it can still be withdrawn until then.
struct PendingStream {
    codec: CodecHandle,
    parameters: Option<StreamParameters>,
    removed: bool,
}

/// Owns the output container for one recording.
///
/// Sequencing is enforced here: one file per muxer, streams only before the
/// header, packets only between header and trailer. A failed header or
/// packet write faults the output for good.
///
/// Stream indices handed out by [`add_stream`](Self::add_stream) are stable
/// for the muxer's life; withdrawn streams leave a gap that is mapped away
/// when the sink creates its own streams.
pub struct ContainerMuxer {
    factory: Box<dyn ContainerFactory>,
    sink: Option<Box<dyn ContainerSink>>,
    path: Option<PathBuf>,
    phase: OutputPhase,
    faulted: bool,
    streams: Vec<PendingStream>,
    sink_indices: Vec<Option<usize>>,
}

impl ContainerMuxer {
    pub fn new(factory: Box<dyn ContainerFactory>) -> Self {
        Self {
            factory,
            sink: None,
            path: None,
            phase: OutputPhase::Closed,
            faulted: false,
            streams: Vec::new(),
            sink_indices: Vec::new(),
        }
    }

    pub fn open_output_file(&mut self, path: &Path) -> Result<()> {
        if self.phase != OutputPhase::Closed {
            return Err(WriterError::OutputAlreadyOpen);
        }
        let sink = self
            .factory
            .create(path)
            .map_err(|source| WriterError::FileOpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Opened output file {}", path.display());
        self.sink = Some(sink);
        self.path = Some(path.to_path_buf());
        self.phase = OutputPhase::Open;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn phase(&self) -> OutputPhase {
        self.phase
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn requires_global_header(&self) -> Result<bool> {
        match self.sink.as_ref() {
            Some(sink) => Ok(sink.requires_global_header()),
            None => Err(WriterError::NoOutputFile),
        }
    }

    /// Reserve a stream for `codec` and return its index.
    pub fn add_stream(&mut self, codec: &CodecHandle) -> Result<usize> {
        self.expect_open()?;
        self.streams.push(PendingStream {
            codec: codec.clone(),
            parameters: None,
            removed: false,
        });
        Ok(self.streams.len() - 1)
    }

    /// Publish encoder parameters; only valid before the header.
    pub fn configure_stream(
        &mut self,
        index: usize,
        parameters: &StreamParameters,
    ) -> std::result::Result<(), BackendError> {
        if self.phase != OutputPhase::Open {
            return Err(BackendError::new(format!(
                "stream parameters cannot change while the output is {}",
                self.phase
            )));
        }
        let stream = self
            .streams
            .get_mut(index)
            .filter(|stream| !stream.removed)
            .ok_or_else(|| BackendError::new(format!("no stream {index} in the output")))?;
        stream.parameters = Some(parameters.clone());
        Ok(())
    }

    /// Withdraw a stream before the header. Its index is never reused.
    pub fn remove_stream(&mut self, index: usize) -> Result<()> {
        self.expect_open()?;
        if let Some(stream) = self.streams.get_mut(index) {
            stream.removed = true;
        }
        Ok(())
    }

    /// Parameters published for stream `index`, if any.
    pub fn stream_parameters(&self, index: usize) -> Option<&StreamParameters> {
        self.streams
            .get(index)
            .filter(|stream| !stream.removed)
            .and_then(|stream| stream.parameters.as_ref())
    }

    /// Create every remaining stream in the sink and write the header.
    pub fn write_header(&mut self) -> Result<()> {
        self.expect_open()?;
        if self.faulted {
            return Err(WriterError::OutputFaulted);
        }
        if let Some(index) = self
            .streams
            .iter()
            .position(|stream| !stream.removed && stream.parameters.is_none())
        {
            return Err(WriterError::IncompleteConfiguration {
                reason: format!("container stream {index} has no parameters"),
            });
        }

        let sink = self.sink.as_mut().ok_or(WriterError::NoOutputFile)?;
        match write_streams_and_header(sink.as_mut(), &self.streams) {
            Ok(indices) => self.sink_indices = indices,
            Err(source) => {
                self.faulted = true;
                log::error!("Writing the container header failed, output is unusable: {source}");
                return Err(WriterError::HeaderWriteFailed(source));
            }
        }
        self.phase = OutputPhase::HeaderWritten;
        log::info!(
            "Wrote container header with {} stream(s)",
            self.sink_indices.iter().flatten().count()
        );
        Ok(())
    }

    pub fn write_packet(&mut self, packet: &EncodedPacket) -> Result<()> {
        if self.faulted {
            return Err(WriterError::OutputFaulted);
        }
        match self.phase {
            OutputPhase::HeaderWritten => {}
            OutputPhase::Closed | OutputPhase::Freed => return Err(WriterError::NoOutputFile),
            _ => return Err(WriterError::HeaderNotWritten),
        }
        let sink_index = self
            .sink_indices
            .get(packet.stream_index)
            .copied()
            .flatten()
            .ok_or_else(|| {
                WriterError::InvalidParameters(format!(
                    "stream {} is not part of the output",
                    packet.stream_index
                ))
            })?;
        let result = self.sink_mut()?.write_packet(sink_index, packet);
        if let Err(source) = result {
            self.faulted = true;
            log::error!(
                "Packet write on stream {} failed, output is unusable: {source}",
                packet.stream_index
            );
            return Err(WriterError::WriteFailed {
                stream: packet.stream_index,
                source,
            });
        }
        Ok(())
    }

    /// Write the trailer. Calling it again afterwards is a no-op.
    pub fn finish_output(&mut self) -> Result<()> {
        match self.phase {
            OutputPhase::TrailerWritten => return Ok(()),
            OutputPhase::HeaderWritten => {}
            OutputPhase::Closed | OutputPhase::Freed => return Err(WriterError::NoOutputFile),
            OutputPhase::Open => return Err(WriterError::HeaderNotWritten),
        }
        if self.faulted {
            return Err(WriterError::OutputFaulted);
        }
        self.sink_mut()?
            .write_trailer()
            .map_err(WriterError::TrailerWriteFailed)?;
        self.phase = OutputPhase::TrailerWritten;
        log::info!("Finished output file");
        Ok(())
    }

    /// Close the file and release the container. Idempotent.
    pub fn free_output(&mut self) {
        if self.sink.is_none() {
            return;
        }
        if self.phase != OutputPhase::TrailerWritten {
            log::warn!(
                "Freeing output {} while {}; the file will not be playable",
                self.path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                self.phase
            );
        }
        self.sink = None;
        self.phase = OutputPhase::Freed;
    }

    fn expect_open(&self) -> Result<()> {
        match self.phase {
            OutputPhase::Open => Ok(()),
            OutputPhase::Closed | OutputPhase::Freed => Err(WriterError::NoOutputFile),
            OutputPhase::HeaderWritten | OutputPhase::TrailerWritten => {
                Err(WriterError::HeaderAlreadyWritten)
            }
        }
    }

    fn sink_mut(&mut self) -> Result<&mut Box<dyn ContainerSink>> {
        self.sink.as_mut().ok_or(WriterError::NoOutputFile)
    }
}

fn write_streams_and_header(
    sink: &mut dyn ContainerSink,
    streams: &[PendingStream],
) -> std::result::Result<Vec<Option<usize>>, BackendError> {
    let mut indices = Vec::with_capacity(streams.len());
    for stream in streams {
        let parameters = match &stream.parameters {
            Some(parameters) if !stream.removed => parameters,
            _ => {
                indices.push(None);
                continue;
            }
        };
        let index = sink.add_stream(&stream.codec)?;
        sink.configure_stream(index, parameters)?;
        indices.push(Some(index));
    }
    sink.write_header()?;
    Ok(indices)
}
