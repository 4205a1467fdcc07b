use crate::shared::media_time::Rational;

/// One compressed packet, timestamped in the encoder's time base.
///
/// Streams keep one of these and let the encoder overwrite it for every
/// packet, so the data allocation is reused across writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
    pub time_base: Rational,
    pub is_keyframe: bool,
    /// Index of the container stream this packet belongs to.
    pub stream_index: usize,
}

impl EncodedPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.pts = None;
        self.dts = None;
        self.duration = 0;
        self.is_keyframe = false;
    }
}
