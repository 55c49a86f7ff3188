pub mod cleanup;
pub mod markdown;
