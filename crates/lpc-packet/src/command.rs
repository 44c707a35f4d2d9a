//! Typed commands with range-checked construction.

use serde::{Serialize, Serializer};

use crate::address::EntityMask;
use crate::constants::*;
use crate::error::Result;
use crate::field::{u16_field, u8_field};

/// When an entity command takes effect.
///
/// The firmware applies the effect at `start_tick + k * repeat_interval` for
/// every `k` in `0..repeat_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub repeat_count: u8,
    pub start_tick: u16,
    pub repeat_interval: u16,
}

impl Schedule {
    /// Validate a repeat schedule.
    pub fn new(repeat_count: i64, start_tick: i64, repeat_interval: i64) -> Result<Self> {
        Ok(Self {
            repeat_count: u8_field("repeat_count", repeat_count)?,
            start_tick: u16_field("start_tick", start_tick)?,
            repeat_interval: u16_field("repeat_interval", repeat_interval)?,
        })
    }

    /// Fire exactly once, at `start_tick`.
    pub const fn once(start_tick: u16) -> Self {
        Self {
            repeat_count: 1,
            start_tick,
            repeat_interval: 0,
        }
    }
}

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::from_raw(0, 0, 0);

    /// Validate a color triple.
    pub fn new(r: i64, g: i64, b: i64) -> Result<Self> {
        Ok(Self {
            r: u8_field("red", r)?,
            g: u8_field("green", g)?,
            b: u8_field("blue", b)?,
        })
    }

    pub const fn from_raw(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Commands that change the ambient behavior of whole slaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SlaveCommand {
    ResetClock,
    DynBlink {
        period: u16,
        on_time: u16,
        dimming: u8,
    },
    DynThrob {
        period: u16,
        ramp_time: u16,
        bright: u8,
        dim: u8,
    },
    /// Five bytes on the wire: opcode `0x03`, address LE, then `probability`
    /// as a 16-bit little-endian field. Values above 255 are valid.
    DynSparkle {
        probability: u16,
    },
    /// At most [`COMMENT_MAX_LEN`] bytes of text.
    Comment {
        #[serde(serialize_with = "lossy_text")]
        text: Vec<u8>,
    },
}

impl SlaveCommand {
    pub fn dyn_blink(period: i64, on_time: i64, dimming: i64) -> Result<Self> {
        Ok(Self::DynBlink {
            period: u16_field("period", period)?,
            on_time: u16_field("on_time", on_time)?,
            dimming: u8_field("dimming", dimming)?,
        })
    }

    pub fn dyn_throb(period: i64, ramp_time: i64, bright: i64, dim: i64) -> Result<Self> {
        Ok(Self::DynThrob {
            period: u16_field("period", period)?,
            ramp_time: u16_field("ramp_time", ramp_time)?,
            bright: u8_field("bright", bright)?,
            dim: u8_field("dim", dim)?,
        })
    }

    pub fn dyn_sparkle(probability: i64) -> Result<Self> {
        Ok(Self::DynSparkle {
            probability: u16_field("probability", probability)?,
        })
    }

    /// Build a comment, keeping only the first [`COMMENT_MAX_LEN`] bytes.
    pub fn comment(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        Self::Comment {
            text: text[..text.len().min(COMMENT_MAX_LEN)].to_vec(),
        }
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Self::ResetClock => CMD_S_RESET_CLOCK,
            Self::DynBlink { .. } => CMD_S_DYN_BLINK,
            Self::DynThrob { .. } => CMD_S_DYN_THROB,
            Self::DynSparkle { .. } => CMD_S_DYN_SPARKLE,
            Self::Comment { .. } => CMD_S_COMMENT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResetClock => "RESET_CLOCK",
            Self::DynBlink { .. } => "DYN_BLINK",
            Self::DynThrob { .. } => "DYN_THROB",
            Self::DynSparkle { .. } => "DYN_SPARKLE",
            Self::Comment { .. } => "COMMENT",
        }
    }
}

/// Commands that change pixel content within the addressed entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EntityCommand {
    FillRgb {
        color: Rgb,
    },
    FillDynamics {
        flags: u8,
    },
    ShiftUp {
        count: u8,
        color: Rgb,
        dynamics: u8,
    },
    ShiftDown {
        count: u8,
        color: Rgb,
        dynamics: u8,
    },
    Rotate {
        count: u8,
        direction: u8,
    },
    Randomize,
    LoadOne {
        index: u8,
        color: Rgb,
        dynamics: u8,
    },
    Rainbow {
        start: u8,
        increment: u8,
        direction: u8,
    },
}

impl EntityCommand {
    pub fn fill_rgb(color: Rgb) -> Self {
        Self::FillRgb { color }
    }

    pub fn fill_dynamics(flags: i64) -> Result<Self> {
        Ok(Self::FillDynamics {
            flags: u8_field("dynamics", flags)?,
        })
    }

    pub fn shift_up(count: i64, color: Rgb, dynamics: i64) -> Result<Self> {
        Ok(Self::ShiftUp {
            count: u8_field("count", count)?,
            color,
            dynamics: u8_field("dynamics", dynamics)?,
        })
    }

    pub fn shift_down(count: i64, color: Rgb, dynamics: i64) -> Result<Self> {
        Ok(Self::ShiftDown {
            count: u8_field("count", count)?,
            color,
            dynamics: u8_field("dynamics", dynamics)?,
        })
    }

    pub fn rotate(count: i64, direction: i64) -> Result<Self> {
        Ok(Self::Rotate {
            count: u8_field("count", count)?,
            direction: u8_field("direction", direction)?,
        })
    }

    pub fn randomize() -> Self {
        Self::Randomize
    }

    pub fn load_one(index: i64, color: Rgb, dynamics: i64) -> Result<Self> {
        Ok(Self::LoadOne {
            index: u8_field("index", index)?,
            color,
            dynamics: u8_field("dynamics", dynamics)?,
        })
    }

    pub fn rainbow(start: i64, increment: i64, direction: i64) -> Result<Self> {
        Ok(Self::Rainbow {
            start: u8_field("start", start)?,
            increment: u8_field("increment", increment)?,
            direction: u8_field("direction", direction)?,
        })
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Self::FillRgb { .. } => CMD_E_FILL_RGB,
            Self::FillDynamics { .. } => CMD_E_FILL_D,
            Self::ShiftUp { .. } => CMD_E_SHIFT_UP,
            Self::ShiftDown { .. } => CMD_E_SHIFT_DOWN,
            Self::Rotate { .. } => CMD_E_ROTATE,
            Self::Randomize => CMD_E_RANDOMIZE,
            Self::LoadOne { .. } => CMD_E_LOADONE,
            Self::Rainbow { .. } => CMD_E_RAINBOW,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FillRgb { .. } => "FILL_RGB",
            Self::FillDynamics { .. } => "FILL_D",
            Self::ShiftUp { .. } => "SHIFT_UP",
            Self::ShiftDown { .. } => "SHIFT_DOWN",
            Self::Rotate { .. } => "ROTATE",
            Self::Randomize => "RANDOMIZE",
            Self::LoadOne { .. } => "LOADONE",
            Self::Rainbow { .. } => "RAINBOW",
        }
    }
}

/// Commands consumed by the master controller itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MetaCommand {
    Console { value: u16 },
    WaitForTick { tick: u16 },
    EndsAtTick { tick: u16 },
    ResetMasterClock,
}

impl MetaCommand {
    pub fn console(value: i64) -> Result<Self> {
        Ok(Self::Console {
            value: u16_field("value", value)?,
        })
    }

    pub fn wait_for_tick(tick: i64) -> Result<Self> {
        Ok(Self::WaitForTick {
            tick: u16_field("tick", tick)?,
        })
    }

    pub fn ends_at_tick(tick: i64) -> Result<Self> {
        Ok(Self::EndsAtTick {
            tick: u16_field("tick", tick)?,
        })
    }

    pub fn subcode(&self) -> u8 {
        match self {
            Self::Console { .. } => META_CONSOLE,
            Self::WaitForTick { .. } => META_WAIT,
            Self::EndsAtTick { .. } => META_ENDS,
            Self::ResetMasterClock => META_RESET_TIME,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Console { .. } => "META_CONSOLE",
            Self::WaitForTick { .. } => "META_WAIT",
            Self::EndsAtTick { .. } => "META_ENDS",
            Self::ResetMasterClock => "META_RESET_TIME",
        }
    }
}

/// One packet's worth of instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Slave {
        address: EntityMask,
        command: SlaveCommand,
    },
    Entity {
        address: EntityMask,
        schedule: Schedule,
        command: EntityCommand,
    },
    Meta {
        command: MetaCommand,
    },
}

impl Command {
    pub fn slave(address: EntityMask, command: SlaveCommand) -> Self {
        Self::Slave { address, command }
    }

    pub fn entity(address: EntityMask, schedule: Schedule, command: EntityCommand) -> Self {
        Self::Entity {
            address,
            schedule,
            command,
        }
    }

    pub fn meta(command: MetaCommand) -> Self {
        Self::Meta { command }
    }

    /// A comment packet; always addressed to every slave.
    pub fn comment(text: impl AsRef<[u8]>) -> Self {
        Self::slave(
            EntityMask::from_raw(COMMENT_ADDRESS),
            SlaveCommand::comment(text),
        )
    }

    /// Protocol mnemonic, e.g. `FILL_RGB` or `META_WAIT`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slave { command, .. } => command.name(),
            Self::Entity { command, .. } => command.name(),
            Self::Meta { command } => command.name(),
        }
    }

    /// First byte on the wire.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Slave { command, .. } => command.opcode(),
            Self::Entity { command, .. } => command.opcode(),
            Self::Meta { .. } => META,
        }
    }

    /// Target entities; meta commands have none.
    pub fn address(&self) -> Option<EntityMask> {
        match self {
            Self::Slave { address, .. } | Self::Entity { address, .. } => Some(*address),
            Self::Meta { .. } => None,
        }
    }

    /// True for commands the master consumes instead of relaying.
    pub fn is_meta(&self) -> bool {
        matches!(self, Self::Meta { .. })
    }
}

fn lossy_text<S: Serializer>(text: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;

    fn rejects(result: Result<impl std::fmt::Debug>, field: &str, width: u32) {
        match result {
            Err(EncodeError::FieldOutOfRange { field: f, width: w, .. }) => {
                assert_eq!((f, w), (field, width));
            }
            other => panic!("expected {field} to be rejected, got {other:?}"),
        }
    }

    #[test]
    fn schedule_field_widths() {
        assert!(Schedule::new(255, 65_535, 65_535).is_ok());
        rejects(Schedule::new(256, 0, 0), "repeat_count", 8);
        rejects(Schedule::new(1, 65_536, 0), "start_tick", 16);
        rejects(Schedule::new(1, 0, 65_536), "repeat_interval", 16);
        rejects(Schedule::new(-1, 0, 0), "repeat_count", 8);
    }

    #[test]
    fn color_field_widths() {
        assert_eq!(Rgb::new(255, 255, 255).unwrap(), Rgb::from_raw(255, 255, 255));
        rejects(Rgb::new(256, 0, 0), "red", 8);
        rejects(Rgb::new(0, 256, 0), "green", 8);
        rejects(Rgb::new(0, 0, 256), "blue", 8);
        // A value that only a silent wrap would accept.
        rejects(Rgb::new(0, 0, 1000), "blue", 8);
    }

    #[test]
    fn slave_field_widths() {
        assert!(SlaveCommand::dyn_blink(65_535, 65_535, 255).is_ok());
        rejects(SlaveCommand::dyn_blink(65_536, 0, 0), "period", 16);
        rejects(SlaveCommand::dyn_blink(0, 65_536, 0), "on_time", 16);
        rejects(SlaveCommand::dyn_blink(0, 0, 256), "dimming", 8);

        assert!(SlaveCommand::dyn_throb(65_535, 65_535, 255, 255).is_ok());
        rejects(SlaveCommand::dyn_throb(65_536, 0, 0, 0), "period", 16);
        rejects(SlaveCommand::dyn_throb(0, 65_536, 0, 0), "ramp_time", 16);
        rejects(SlaveCommand::dyn_throb(0, 0, 256, 0), "bright", 8);
        rejects(SlaveCommand::dyn_throb(0, 0, 0, 256), "dim", 8);

        assert!(SlaveCommand::dyn_sparkle(65_535).is_ok());
        rejects(SlaveCommand::dyn_sparkle(65_536), "probability", 16);
    }

    #[test]
    fn entity_field_widths() {
        assert!(EntityCommand::fill_dynamics(255).is_ok());
        rejects(EntityCommand::fill_dynamics(256), "dynamics", 8);

        for ctor in [EntityCommand::shift_up, EntityCommand::shift_down, EntityCommand::load_one] {
            assert!(ctor(255, Rgb::BLACK, 255).is_ok());
            assert!(ctor(256, Rgb::BLACK, 0).is_err());
            assert!(ctor(0, Rgb::BLACK, 256).is_err());
        }
        rejects(EntityCommand::shift_up(256, Rgb::BLACK, 0), "count", 8);
        rejects(EntityCommand::load_one(256, Rgb::BLACK, 0), "index", 8);

        assert!(EntityCommand::rotate(255, 255).is_ok());
        rejects(EntityCommand::rotate(256, 0), "count", 8);
        rejects(EntityCommand::rotate(0, 256), "direction", 8);

        assert!(EntityCommand::rainbow(255, 255, 255).is_ok());
        rejects(EntityCommand::rainbow(256, 0, 0), "start", 8);
        rejects(EntityCommand::rainbow(0, 256, 0), "increment", 8);
        rejects(EntityCommand::rainbow(0, 0, 256), "direction", 8);
    }

    #[test]
    fn meta_field_widths() {
        assert!(MetaCommand::console(65_535).is_ok());
        rejects(MetaCommand::console(65_536), "value", 16);
        assert!(MetaCommand::wait_for_tick(65_535).is_ok());
        rejects(MetaCommand::wait_for_tick(65_536), "tick", 16);
        assert!(MetaCommand::ends_at_tick(65_535).is_ok());
        rejects(MetaCommand::ends_at_tick(65_536), "tick", 16);
    }

    #[test]
    fn comment_is_truncated_not_rejected() {
        let cmd = SlaveCommand::comment("Twenty characters!!!");
        assert_eq!(
            cmd,
            SlaveCommand::Comment {
                text: b"Twenty char".to_vec()
            }
        );
        assert_eq!(
            SlaveCommand::comment("Mark"),
            SlaveCommand::Comment {
                text: b"Mark".to_vec()
            }
        );
    }

    #[test]
    fn names_and_addresses() {
        let wait = Command::meta(MetaCommand::wait_for_tick(300).unwrap());
        assert_eq!(wait.name(), "META_WAIT");
        assert_eq!(wait.opcode(), META);
        assert!(wait.is_meta());
        assert_eq!(wait.address(), None);

        let fill = Command::entity(
            EntityMask::SIDES,
            Schedule::once(0),
            EntityCommand::randomize(),
        );
        assert_eq!(fill.name(), "RANDOMIZE");
        assert_eq!(fill.address(), Some(EntityMask::SIDES));
        assert_eq!(Command::comment("x").address(), Some(EntityMask::ALL));
    }

    #[test]
    fn serializes_with_tags() {
        let cmd = Command::comment("hi");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["kind"], "slave");
        assert_eq!(json["address"], 0xFFFF);
        assert_eq!(json["command"]["op"], "comment");
        assert_eq!(json["command"]["text"], "hi");
    }
}
