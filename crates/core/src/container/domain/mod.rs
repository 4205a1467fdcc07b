pub mod container_muxer;
pub mod container_sink;
