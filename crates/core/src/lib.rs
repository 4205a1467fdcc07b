pub mod audio;
pub mod capture;
pub mod codec;
pub mod container;
pub mod encoding;
pub mod shared;
pub mod stream;
pub mod video;
pub mod writer;

#[cfg(test)]
mod test_support;
