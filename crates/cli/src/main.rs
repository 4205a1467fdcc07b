mod synthetic_capture;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use crossbeam_channel::Receiver;

use screen_record_core::audio::domain::audio_buffer_list::AudioBufferList;
use screen_record_core::audio::domain::format_descriptor::{
    AudioFormatDescriptor, ByteOrder, SampleFormat,
};
use screen_record_core::capture::recording_profile::{AudioProfile, RecordingProfile};
use screen_record_core::capture::recording_session::RecordingSession;
use screen_record_core::video::domain::video_sample::VideoSample;
use screen_record_core::writer::screen_record_writer::ScreenRecordWriter;
use screen_record_core::writer::writer_backend::WriterBackend;

use synthetic_capture::{spawn_capture, CaptureSample, CaptureSettings};

const CHANNEL_CAPACITY: usize = 16;
const MAX_DURATION_SECS: f64 = 3600.0;

/// Record a synthetic screen capture (moving test pattern, screen tone and
/// microphone tone) into a media file.
#[derive(Parser)]
#[command(name = "screen-record")]
struct Cli {
    /// Output file. The container format follows the extension unless
    /// --format is given.
    output: PathBuf,

    /// Video encoder or codec name (e.g. h264, libx264, h264_videotoolbox, mpeg4).
    #[arg(long, default_value = "h264")]
    video_codec: String,

    /// Audio encoder or codec name (e.g. aac, aac_at, opus).
    #[arg(long, default_value = "aac")]
    audio_codec: String,

    /// Captured screen width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Captured screen height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Video frame rate (default 120).
    #[arg(long)]
    frame_rate: Option<u32>,

    /// Video bit rate in bits per second (default 8000000).
    #[arg(long)]
    video_bit_rate: Option<u64>,

    /// Screen audio sample rate (default 44100).
    #[arg(long)]
    screen_sample_rate: Option<u32>,

    /// Screen audio bit rate (default 320000).
    #[arg(long)]
    screen_bit_rate: Option<u64>,

    /// Microphone sample rate (default 48000).
    #[arg(long)]
    mic_sample_rate: Option<u32>,

    /// Microphone bit rate (default 320000).
    #[arg(long)]
    mic_bit_rate: Option<u64>,

    /// Record without a microphone stream.
    #[arg(long)]
    no_mic: bool,

    /// Length of the recording in seconds.
    #[arg(long, default_value = "5")]
    duration: f64,

    /// Force a container format by name (e.g. matroska, mp4, mov).
    #[arg(long)]
    format: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let profile = build_profile(&cli);
    let settings = CaptureSettings {
        width: cli.width,
        height: cli.height,
        frame_rate: profile.frame_rate,
        screen_rate: profile.screen_audio.sample_rate,
        mic_rate: profile.microphone.map(|mic| mic.sample_rate),
        duration_secs: cli.duration,
    };

    let backend = match cli.format.as_deref() {
        Some(name) => WriterBackend::ffmpeg_with_format(name)?,
        None => WriterBackend::ffmpeg()?,
    };
    let mut session = RecordingSession::new(ScreenRecordWriter::new(backend), profile)?;
    session.start(&cli.output)?;

    let (tx, rx) = crossbeam_channel::bounded::<CaptureSample>(CHANNEL_CAPACITY);
    let capture = spawn_capture(settings, tx);
    let fed = feed_session(&mut session, rx, settings.total_frames());
    let produced = capture
        .join()
        .map_err(|_| "Capture thread panicked")?;
    fed?;
    eprintln!();
    log::debug!("Capture produced {produced} samples");

    let stats = session.stop()?;
    log::info!(
        "Output written to {} ({} frames, {} dropped samples)",
        cli.output.display(),
        stats.video_frames,
        stats.dropped
    );
    Ok(())
}

/// Hand every captured sample to the session until the capture ends. The
/// receiver is dropped on error, which stops the capture thread.
fn feed_session(
    session: &mut RecordingSession,
    rx: Receiver<CaptureSample>,
    total_frames: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (screen_format, mic_format) = capture_formats(session.profile());
    let mut frames = 0u64;

    for sample in rx {
        match sample {
            CaptureSample::Video {
                width,
                height,
                luma,
                chroma,
                at,
            } => {
                let sample = VideoSample {
                    width,
                    height,
                    luma: &luma,
                    luma_stride: width as usize,
                    chroma: &chroma,
                    chroma_stride: (width as usize).div_ceil(2) * 2,
                    pts: at,
                };
                session.process_video(&sample)?;
                frames += 1;
                eprint!("\rRecording frame {frames}/{total_frames}");
            }
            CaptureSample::ScreenAudio { data, at } => {
                session.process_screen_audio(&AudioBufferList::single(&data), &screen_format, at)?;
            }
            CaptureSample::MicAudio { data, at } => {
                session.process_mic_audio(&AudioBufferList::single(&data), &mic_format, at)?;
            }
        }
    }
    Ok(())
}

/// Formats the synthetic capture delivers: stereo S16 for the screen, mono
/// big-endian float for the microphone.
fn capture_formats(profile: &RecordingProfile) -> (AudioFormatDescriptor, AudioFormatDescriptor) {
    let screen =
        AudioFormatDescriptor::interleaved(profile.screen_audio.sample_rate, 2, SampleFormat::S16);
    let mic_rate = profile
        .microphone
        .map_or(profile.screen_audio.sample_rate, |mic| mic.sample_rate);
    let mic = AudioFormatDescriptor::interleaved(mic_rate, 1, SampleFormat::F32)
        .with_byte_order(ByteOrder::Big);
    (screen, mic)
}

fn build_profile(cli: &Cli) -> RecordingProfile {
    let defaults = RecordingProfile::default();
    let default_mic = defaults.microphone.unwrap_or(defaults.screen_audio);
    RecordingProfile {
        video_codec: cli.video_codec.clone(),
        audio_codec: cli.audio_codec.clone(),
        frame_rate: cli.frame_rate.unwrap_or(defaults.frame_rate),
        video_bit_rate: cli.video_bit_rate.unwrap_or(defaults.video_bit_rate),
        screen_audio: AudioProfile {
            sample_rate: cli
                .screen_sample_rate
                .unwrap_or(defaults.screen_audio.sample_rate),
            bit_rate: cli.screen_bit_rate.unwrap_or(defaults.screen_audio.bit_rate),
        },
        microphone: (!cli.no_mic).then(|| AudioProfile {
            sample_rate: cli.mic_sample_rate.unwrap_or(default_mic.sample_rate),
            bit_rate: cli.mic_bit_rate.unwrap_or(default_mic.bit_rate),
        }),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(format!("Output directory not found: {}", parent.display()).into());
        }
    }
    if cli.width < 2 || cli.height < 2 {
        return Err(format!(
            "Screen size must be at least 2x2, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if !(cli.duration > 0.0 && cli.duration <= MAX_DURATION_SECS) {
        return Err(format!(
            "Duration must be between 0 and {MAX_DURATION_SECS} seconds, got {}",
            cli.duration
        )
        .into());
    }
    if cli.no_mic && (cli.mic_sample_rate.is_some() || cli.mic_bit_rate.is_some()) {
        return Err("--no-mic cannot be combined with microphone settings".into());
    }
    build_profile(cli).validate()?;
    Ok(())
}
