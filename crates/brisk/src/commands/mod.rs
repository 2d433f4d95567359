pub mod build;
pub mod clean;
pub mod init;
pub mod task;
pub mod watch;
