pub mod recording_profile;
pub mod recording_session;
pub mod session_clock;
