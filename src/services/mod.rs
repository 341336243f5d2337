pub mod logs;
pub mod trends;
