use std::path::{Component, Path, PathBuf};

use lpc_frame::FrameWriter;
use lpc_packet::{
    Command, EntityCommand, EntityMask, MetaCommand, Rgb, Schedule, SlaveCommand, COMMENT_MAX_LEN,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::ProgramConfig;
use crate::error::{ProgramError, Result};
use crate::sink::{Sink, StagedFile};

/// What a finished compilation produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramSummary {
    /// Final artifact path, when the sink was a file.
    pub output: Option<PathBuf>,
    /// Packets written, in emission order.
    pub packets: u64,
    /// Wire bytes written, framing included.
    pub bytes: u64,
}

/// A single compilation session.
///
/// Owns exactly one output sink for its lifetime and writes every packet as
/// soon as it is emitted. The session keeps no notion of the current tick;
/// scheduling arithmetic belongs to the caller.
pub struct Program {
    config: ProgramConfig,
    writer: Option<FrameWriter<Box<dyn Sink>>>,
    rng: ChaCha8Rng,
}

impl Program {
    pub fn new(config: ProgramConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            writer: None,
            rng,
        }
    }

    /// Designate the output file. Must be called once, before any emission.
    ///
    /// `name` must be a bare file name; it is placed in the configured
    /// output directory. Returns the final path.
    pub fn set_output(&mut self, name: &str) -> Result<PathBuf> {
        self.ensure_no_output()?;
        validate_output_name(name)?;

        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).map_err(|source| ProgramError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(name);
        let staged = StagedFile::create(&path).map_err(|source| ProgramError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(output = %path.display(), "output designated");
        self.install(Box::new(staged));
        Ok(path)
    }

    /// Install an arbitrary sink in place of a file.
    pub fn set_output_sink(&mut self, sink: Box<dyn Sink>) -> Result<()> {
        self.ensure_no_output()?;
        self.install(sink);
        Ok(())
    }

    pub fn has_output(&self) -> bool {
        self.writer.is_some()
    }

    /// Final path of the designated output file, if any.
    pub fn output_path(&self) -> Option<&Path> {
        self.writer.as_ref().and_then(|writer| writer.get_ref().path())
    }

    pub fn packets_emitted(&self) -> u64 {
        self.writer.as_ref().map_or(0, FrameWriter::frames_written)
    }

    pub fn bytes_emitted(&self) -> u64 {
        self.writer.as_ref().map_or(0, FrameWriter::bytes_written)
    }

    /// Encode, frame and write one command.
    pub fn emit(&mut self, command: &Command) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(ProgramError::NoOutput)?;
        let payload = command.encode();
        let wire = writer.send(&payload)?;
        tracing::debug!(
            packet = writer.frames_written(),
            command = command.name(),
            payload = payload.len(),
            wire,
            "packet emitted"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Slave commands
    // ------------------------------------------------------------------

    pub fn reset_clock(&mut self, address: EntityMask) -> Result<()> {
        self.emit(&Command::slave(address, SlaveCommand::ResetClock))
    }

    pub fn dyn_blink(
        &mut self,
        address: EntityMask,
        period: i64,
        on_time: i64,
        dimming: i64,
    ) -> Result<()> {
        let command = SlaveCommand::dyn_blink(period, on_time, dimming)?;
        self.emit(&Command::slave(address, command))
    }

    pub fn dyn_throb(
        &mut self,
        address: EntityMask,
        period: i64,
        ramp_time: i64,
        bright: i64,
        dim: i64,
    ) -> Result<()> {
        let command = SlaveCommand::dyn_throb(period, ramp_time, bright, dim)?;
        self.emit(&Command::slave(address, command))
    }

    pub fn dyn_sparkle(&mut self, address: EntityMask, probability: i64) -> Result<()> {
        let command = SlaveCommand::dyn_sparkle(probability)?;
        self.emit(&Command::slave(address, command))
    }

    /// Readable text in the packet stream; longer text keeps its first 11 bytes.
    pub fn comment(&mut self, text: &str) -> Result<()> {
        if text.len() > COMMENT_MAX_LEN {
            tracing::warn!(text, max = COMMENT_MAX_LEN, "comment truncated");
        }
        self.emit(&Command::comment(text))
    }

    // ------------------------------------------------------------------
    // Entity commands
    // ------------------------------------------------------------------

    pub fn fill_rgb(&mut self, address: EntityMask, schedule: Schedule, color: Rgb) -> Result<()> {
        self.emit(&Command::entity(
            address,
            schedule,
            EntityCommand::fill_rgb(color),
        ))
    }

    pub fn fill_dynamics(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        flags: i64,
    ) -> Result<()> {
        let command = EntityCommand::fill_dynamics(flags)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    pub fn shift_up(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        count: i64,
        color: Rgb,
        dynamics: i64,
    ) -> Result<()> {
        let command = EntityCommand::shift_up(count, color, dynamics)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    pub fn shift_down(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        count: i64,
        color: Rgb,
        dynamics: i64,
    ) -> Result<()> {
        let command = EntityCommand::shift_down(count, color, dynamics)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    pub fn rotate(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        count: i64,
        direction: i64,
    ) -> Result<()> {
        let command = EntityCommand::rotate(count, direction)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    pub fn randomize(&mut self, address: EntityMask, schedule: Schedule) -> Result<()> {
        self.emit(&Command::entity(
            address,
            schedule,
            EntityCommand::randomize(),
        ))
    }

    pub fn load_one(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        index: i64,
        color: Rgb,
        dynamics: i64,
    ) -> Result<()> {
        let command = EntityCommand::load_one(index, color, dynamics)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    pub fn rainbow(
        &mut self,
        address: EntityMask,
        schedule: Schedule,
        start: i64,
        increment: i64,
        direction: i64,
    ) -> Result<()> {
        let command = EntityCommand::rainbow(start, increment, direction)?;
        self.emit(&Command::entity(address, schedule, command))
    }

    // ------------------------------------------------------------------
    // Meta commands
    // ------------------------------------------------------------------

    pub fn console(&mut self, value: i64) -> Result<()> {
        self.emit(&Command::meta(MetaCommand::console(value)?))
    }

    pub fn wait_for_tick(&mut self, tick: i64) -> Result<()> {
        self.emit(&Command::meta(MetaCommand::wait_for_tick(tick)?))
    }

    pub fn ends_at_tick(&mut self, tick: i64) -> Result<()> {
        self.emit(&Command::meta(MetaCommand::ends_at_tick(tick)?))
    }

    pub fn reset_master_clock(&mut self) -> Result<()> {
        self.emit(&Command::meta(MetaCommand::ResetMasterClock))
    }

    // ------------------------------------------------------------------
    // Randomness
    // ------------------------------------------------------------------

    /// Restart the random source from `seed`.
    pub fn seed(&mut self, seed: u64) {
        tracing::debug!(seed, "random source reseeded");
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Uniform draw from `lo..hi`.
    pub fn random_range(&mut self, lo: i64, hi: i64) -> Result<i64> {
        if lo >= hi {
            return Err(ProgramError::EmptyRandomRange { lo, hi });
        }
        Ok(self.rng.gen_range(lo..hi))
    }

    /// Uniform draw from `0..n`.
    pub fn random_below(&mut self, n: i64) -> Result<i64> {
        self.random_range(0, n)
    }

    /// Flush and commit the output, consuming the session.
    pub fn finish(self) -> Result<ProgramSummary> {
        let mut writer = self.writer.ok_or(ProgramError::NoOutput)?;
        writer.flush()?;

        let packets = writer.frames_written();
        let bytes = writer.bytes_written();
        let sink = writer.into_inner();
        let output = sink.path().map(Path::to_path_buf);
        sink.commit().map_err(|source| ProgramError::Io {
            path: output.clone().unwrap_or_default(),
            source,
        })?;

        tracing::info!(
            output = %output.as_deref().unwrap_or(Path::new("<sink>")).display(),
            packets,
            bytes,
            "program complete"
        );
        Ok(ProgramSummary {
            output,
            packets,
            bytes,
        })
    }

    fn ensure_no_output(&self) -> Result<()> {
        match &self.writer {
            None => Ok(()),
            Some(writer) => Err(ProgramError::OutputAlreadySet(
                writer
                    .get_ref()
                    .path()
                    .map_or_else(|| "<sink>".to_string(), |p| p.display().to_string()),
            )),
        }
    }

    fn install(&mut self, sink: Box<dyn Sink>) {
        self.writer = Some(FrameWriter::with_config(sink, self.config.frame.clone()));
    }
}

fn validate_output_name(name: &str) -> Result<()> {
    let invalid = |reason| ProgramError::InvalidOutputName {
        name: name.to_string(),
        reason,
    };
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (None, _) => Err(invalid("name is empty")),
        _ => Err(invalid("must be a bare file name without directories")),
    }
}
