use std::f32::consts::TAU;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use screen_record_core::shared::media_time::MediaTime;

const NANOS: i64 = 1_000_000_000;
/// Capture clocks do not start at zero; neither does this one.
const HOST_CLOCK_START: i64 = 1_000 * NANOS;
const MIC_START_DELAY: i64 = NANOS / 4;
/// Frames per audio buffer, as screen capture delivers them.
pub const AUDIO_BUFFER_FRAMES: usize = 1024;

const SCREEN_TONE_HZ: f32 = 440.0;
const MIC_TONE_HZ: f32 = 660.0;

#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub screen_rate: u32,
    pub mic_rate: Option<u32>,
    pub duration_secs: f64,
}

impl CaptureSettings {
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs * self.frame_rate as f64).ceil() as u64
    }
}

/// One captured buffer, owned so it can cross threads.
pub enum CaptureSample {
    Video {
        width: u32,
        height: u32,
        luma: Vec<u8>,
        chroma: Vec<u8>,
        at: MediaTime,
    },
    /// Interleaved stereo S16, native byte order.
    ScreenAudio { data: Vec<u8>, at: MediaTime },
    /// Mono F32, big-endian.
    MicAudio { data: Vec<u8>, at: MediaTime },
}

/// Produce `settings.duration_secs` of capture in timestamp order on a
/// background thread. Returns the number of samples sent; stops early if
/// the receiver hangs up.
pub fn spawn_capture(settings: CaptureSettings, tx: Sender<CaptureSample>) -> JoinHandle<u64> {
    std::thread::spawn(move || {
        let end = (settings.duration_secs * NANOS as f64) as i64;
        let mut video_index: i64 = 0;
        let mut screen_offset: i64 = 0;
        let mut mic_offset: i64 = 0;
        let mut sent = 0;

        loop {
            let video_at = video_index * NANOS / settings.frame_rate as i64;
            let screen_at = screen_offset * NANOS / settings.screen_rate as i64;
            let mic_at = settings
                .mic_rate
                .map(|rate| MIC_START_DELAY + mic_offset * NANOS / rate as i64);

            let next = video_at.min(screen_at).min(mic_at.unwrap_or(i64::MAX));
            if next >= end {
                break;
            }

            let sample = if next == video_at {
                let (luma, chroma) = test_pattern(settings.width, settings.height, video_index);
                video_index += 1;
                CaptureSample::Video {
                    width: settings.width,
                    height: settings.height,
                    luma,
                    chroma,
                    at: host_time(video_at),
                }
            } else if next == screen_at {
                let data = screen_tone(settings.screen_rate, screen_offset);
                screen_offset += AUDIO_BUFFER_FRAMES as i64;
                CaptureSample::ScreenAudio {
                    data,
                    at: host_time(screen_at),
                }
            } else {
                let rate = settings.mic_rate.unwrap_or(settings.screen_rate);
                let data = mic_tone(rate, mic_offset);
                mic_offset += AUDIO_BUFFER_FRAMES as i64;
                CaptureSample::MicAudio {
                    data,
                    at: host_time(next),
                }
            };

            if tx.send(sample).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    })
}

fn host_time(offset: i64) -> MediaTime {
    MediaTime::new(HOST_CLOCK_START + offset, NANOS as i32)
}

/// NV12 diagonal gradient that scrolls four pixels per frame.
fn test_pattern(width: u32, height: u32, frame: i64) -> (Vec<u8>, Vec<u8>) {
    let (w, h) = (width as usize, height as usize);
    let shift = (frame * 4) as usize;
    let luma = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            (16 + (x + y + shift) % 220) as u8
        })
        .collect();

    let chroma_w = w.div_ceil(2);
    let chroma_h = h.div_ceil(2);
    let mut chroma = Vec::with_capacity(chroma_w * chroma_h * 2);
    for y in 0..chroma_h {
        for x in 0..chroma_w {
            chroma.push((64 + (x + shift / 2) % 128) as u8);
            chroma.push((64 + (y + shift / 2) % 128) as u8);
        }
    }
    (luma, chroma)
}

fn screen_tone(rate: u32, offset: i64) -> Vec<u8> {
    let samples: Vec<i16> = (0..AUDIO_BUFFER_FRAMES)
        .flat_map(|i| {
            let t = (offset + i as i64) as f32 / rate as f32;
            let v = ((t * SCREEN_TONE_HZ * TAU).sin() * 0.25 * i16::MAX as f32) as i16;
            [v, v]
        })
        .collect();
    bytemuck::cast_slice(&samples).to_vec()
}

fn mic_tone(rate: u32, offset: i64) -> Vec<u8> {
    let words: Vec<u32> = (0..AUDIO_BUFFER_FRAMES)
        .map(|i| {
            let t = (offset + i as i64) as f32 / rate as f32;
            ((t * MIC_TONE_HZ * TAU).sin() * 0.25).to_bits().to_be()
        })
        .collect();
    bytemuck::cast_slice(&words).to_vec()
}
