pub mod encoded_packet;
pub mod encoder;
pub mod encoder_factory;
pub mod stream_config;
pub mod stream_parameters;
