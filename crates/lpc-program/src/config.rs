use std::path::PathBuf;

use lpc_frame::FrameConfig;

/// Controls where a program writes and how it draws random numbers.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Directory that output names are resolved against.
    pub output_dir: PathBuf,
    /// Initial seed for the program's random source.
    pub seed: u64,
    /// Framing limits applied to every packet.
    pub frame: FrameConfig,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            seed: 0,
            frame: FrameConfig::default(),
        }
    }
}
