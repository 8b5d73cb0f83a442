pub mod context;
pub mod init;
pub mod project;
