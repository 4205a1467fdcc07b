pub mod ffmpeg_audio_encoder;
pub mod ffmpeg_encoder_factory;
pub mod ffmpeg_video_encoder;
mod packet_receiver;
