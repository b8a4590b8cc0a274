pub mod archive;
pub mod audit;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod journal;
pub mod media;
pub mod paths;
pub mod session;
pub mod util;
