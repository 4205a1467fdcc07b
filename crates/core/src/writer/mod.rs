pub mod screen_record_writer;
pub mod writer_backend;
