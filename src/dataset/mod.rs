/// Dataset folder access
///
/// This module handles:
/// - Pairing images with caption files in a folder (scanner.rs)
/// - Reading, saving and reloading caption files (caption.rs)
/// - Decoding images for display (preview.rs)

pub mod caption;
pub mod preview;
pub mod scanner;
