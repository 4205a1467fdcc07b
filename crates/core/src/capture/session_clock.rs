use crate::shared::media_time::MediaTime;

/// Maps capture timestamps onto the output streams' tick counts.
///
/// The first video sample is time zero for video and screen audio. The
/// microphone runs on its own clock, so its epoch is placed so that its
/// first sample lines up with the video time elapsed when it arrived.
#[derive(Debug, Clone)]
pub struct SessionClock {
    frame_rate: u32,
    screen_rate: u32,
    mic_rate: u32,
    first_video: Option<MediaTime>,
    video_elapsed: Option<MediaTime>,
    last_video_pts: Option<i64>,
    mic_epoch: Option<MediaTime>,
}

impl SessionClock {
    pub fn new(frame_rate: u32, screen_rate: u32, mic_rate: u32) -> Self {
        Self {
            frame_rate,
            screen_rate,
            mic_rate,
            first_video: None,
            video_elapsed: None,
            last_video_pts: None,
            mic_epoch: None,
        }
    }

    /// Frame index for a video sample captured at `t`, or `None` when the
    /// sample does not advance past the previous frame.
    pub fn video_pts(&mut self, t: MediaTime) -> Option<i64> {
        let first = *self.first_video.get_or_insert(t);
        let elapsed = t.checked_sub(first)?;
        if elapsed.value < 0 {
            return None;
        }
        let pts = elapsed.count_at_rate(self.frame_rate);
        if self.last_video_pts.is_some_and(|last| pts <= last) {
            return None;
        }
        self.last_video_pts = Some(pts);
        self.video_elapsed = Some(elapsed);
        Some(pts)
    }

    /// Sample index for screen audio captured at `t`. Audio from before the
    /// first video sample has no place in the file.
    pub fn screen_audio_pts(&self, t: MediaTime) -> Option<i64> {
        let elapsed = t.checked_sub(self.first_video?)?;
        (elapsed.value >= 0).then(|| elapsed.count_at_rate(self.screen_rate))
    }

    /// Sample index for microphone audio captured at `t`.
    pub fn mic_audio_pts(&mut self, t: MediaTime) -> Option<i64> {
        let epoch = match self.mic_epoch {
            Some(epoch) => epoch,
            None => *self.mic_epoch.insert(t.checked_sub(self.video_elapsed?)?),
        };
        let elapsed = t.checked_sub(epoch)?;
        (elapsed.value >= 0).then(|| elapsed.count_at_rate(self.mic_rate))
    }
}
