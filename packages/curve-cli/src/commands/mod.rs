pub mod compact;
pub mod filter;
pub mod presets;
pub mod replay;
