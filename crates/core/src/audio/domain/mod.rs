pub mod audio_buffer_list;
pub mod audio_converter;
pub mod format_converter;
pub mod format_descriptor;
pub mod input_queue;
pub mod sample_buffer;
