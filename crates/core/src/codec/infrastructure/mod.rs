pub mod ffmpeg_codec_catalog;
