pub mod ffmpeg_container;
