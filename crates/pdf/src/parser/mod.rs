pub mod backend;
pub mod classify;
pub mod content;
pub mod group;
pub mod lines;
