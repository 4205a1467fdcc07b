pub mod plane_copy;
pub mod video_frame;
pub mod video_sample;
