pub mod swr_audio_converter;
