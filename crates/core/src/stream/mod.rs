pub mod packet_pump;
pub mod stream_phase;
pub mod stream_registry;
pub mod stream_state;
