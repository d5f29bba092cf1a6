pub mod archive;
pub mod notion;
pub mod storage;
