pub mod codec_catalog;
pub mod codec_handle;
pub mod codec_session_manager;
