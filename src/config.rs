use crate::Args;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Tesseract language code for the leptess backend
    pub language: String,
    pub max_file_size: usize,
    /// Directory annotated image copies are written to
    pub output_dir: PathBuf,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            language: args.language,
            max_file_size: args.max_file_size,
            output_dir: args.output_dir,
        }
    }
}
