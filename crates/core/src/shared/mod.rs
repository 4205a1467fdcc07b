pub mod constants;
pub mod error;
pub mod ffmpeg_support;
pub mod media_time;
pub mod slot;
