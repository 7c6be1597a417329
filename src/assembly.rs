pub mod buffers;
pub mod global;
pub mod local;
