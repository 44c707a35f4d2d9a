//! Fixed-layout packet encoding.
//!
//! Opcode first, then fields in declaration order. Multi-byte fields are
//! little-endian. Entity packets share an eight byte header:
//!
//! ```text
//! +--------+---------+---------+--------+-----------+-----------+--------------+--------------+------
//! | opcode | addr.LO | addr.HI | repeat | start.LO  | start.HI  | interval.LO  | interval.HI  | data...
//! +--------+---------+---------+--------+-----------+-----------+--------------+--------------+------
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::address::EntityMask;
use crate::command::{Command, EntityCommand, MetaCommand, Rgb, Schedule, SlaveCommand};
use crate::constants::*;
use crate::error::DecodeError;

/// Append the wire encoding of `command` to `dst`.
pub fn encode_command(command: &Command, dst: &mut BytesMut) {
    dst.reserve(PACKET_MAX);
    dst.put_u8(command.opcode());
    match command {
        Command::Slave { address, command } => encode_slave(*address, command, dst),
        Command::Entity {
            address,
            schedule,
            command,
        } => {
            dst.put_u16_le(address.bits());
            dst.put_u8(schedule.repeat_count);
            dst.put_u16_le(schedule.start_tick);
            dst.put_u16_le(schedule.repeat_interval);
            encode_entity(command, dst);
        }
        Command::Meta { command } => {
            dst.put_u8(command.subcode());
            match *command {
                MetaCommand::Console { value } => dst.put_u16_le(value),
                MetaCommand::WaitForTick { tick } | MetaCommand::EndsAtTick { tick } => {
                    dst.put_u16_le(tick)
                }
                MetaCommand::ResetMasterClock => {}
            }
        }
    }
}

fn encode_slave(address: EntityMask, command: &SlaveCommand, dst: &mut BytesMut) {
    match command {
        SlaveCommand::Comment { text } => {
            dst.put_u16_le(COMMENT_ADDRESS);
            dst.put_slice(text);
            return;
        }
        _ => dst.put_u16_le(address.bits()),
    }
    match *command {
        SlaveCommand::ResetClock | SlaveCommand::Comment { .. } => {}
        SlaveCommand::DynBlink {
            period,
            on_time,
            dimming,
        } => {
            dst.put_u16_le(period);
            dst.put_u16_le(on_time);
            dst.put_u8(dimming);
        }
        SlaveCommand::DynThrob {
            period,
            ramp_time,
            bright,
            dim,
        } => {
            dst.put_u16_le(period);
            dst.put_u16_le(ramp_time);
            dst.put_u8(bright);
            dst.put_u8(dim);
        }
        SlaveCommand::DynSparkle { probability } => dst.put_u16_le(probability),
    }
}

fn encode_entity(command: &EntityCommand, dst: &mut BytesMut) {
    match *command {
        EntityCommand::FillRgb { color } => put_rgb(color, dst),
        EntityCommand::FillDynamics { flags } => dst.put_u8(flags),
        EntityCommand::ShiftUp {
            count,
            color,
            dynamics,
        }
        | EntityCommand::ShiftDown {
            count,
            color,
            dynamics,
        } => {
            dst.put_u8(count);
            put_rgb(color, dst);
            dst.put_u8(dynamics);
        }
        EntityCommand::Rotate { count, direction } => {
            dst.put_u8(count);
            dst.put_u8(direction);
        }
        EntityCommand::Randomize => {}
        EntityCommand::LoadOne {
            index,
            color,
            dynamics,
        } => {
            dst.put_u8(index);
            put_rgb(color, dst);
            dst.put_u8(dynamics);
        }
        EntityCommand::Rainbow {
            start,
            increment,
            direction,
        } => {
            dst.put_u8(start);
            dst.put_u8(increment);
            dst.put_u8(direction);
        }
    }
}

fn put_rgb(color: Rgb, dst: &mut BytesMut) {
    dst.put_slice(&[color.r, color.g, color.b]);
}

impl Command {
    /// Encode this command to its raw (unframed) packet bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(PACKET_MAX);
        encode_command(self, &mut buf);
        buf.to_vec()
    }
}

/// Decode raw (unframed) packet bytes into a command.
pub fn decode_command(packet: &[u8]) -> Result<Command, DecodeError> {
    let Some((&opcode, _)) = packet.split_first() else {
        return Err(DecodeError::Empty);
    };

    match opcode {
        META => decode_meta(packet),
        CMD_S_COMMENT => {
            expect_len_range(packet, "COMMENT", 3, 3 + COMMENT_MAX_LEN)?;
            let mut buf = &packet[1..];
            let address = buf.get_u16_le();
            if address != COMMENT_ADDRESS {
                return Err(DecodeError::CommentAddress(address));
            }
            Ok(Command::comment(buf))
        }
        CMD_S_RESET_CLOCK..=CMD_S_DYN_SPARKLE => decode_slave(opcode, packet),
        CMD_E_FILL_RGB..=CMD_E_RAINBOW => decode_entity(opcode, packet),
        other => Err(DecodeError::UnknownOpcode(other)),
    }
}

fn decode_slave(opcode: u8, packet: &[u8]) -> Result<Command, DecodeError> {
    let (name, len) = match opcode {
        CMD_S_RESET_CLOCK => ("RESET_CLOCK", 3),
        CMD_S_DYN_BLINK => ("DYN_BLINK", 8),
        CMD_S_DYN_THROB => ("DYN_THROB", 9),
        _ => ("DYN_SPARKLE", 5),
    };
    expect_len(packet, name, len)?;

    let mut buf = &packet[1..];
    let address = EntityMask::from_raw(buf.get_u16_le());
    let command = match opcode {
        CMD_S_RESET_CLOCK => SlaveCommand::ResetClock,
        CMD_S_DYN_BLINK => SlaveCommand::DynBlink {
            period: buf.get_u16_le(),
            on_time: buf.get_u16_le(),
            dimming: buf.get_u8(),
        },
        CMD_S_DYN_THROB => SlaveCommand::DynThrob {
            period: buf.get_u16_le(),
            ramp_time: buf.get_u16_le(),
            bright: buf.get_u8(),
            dim: buf.get_u8(),
        },
        _ => SlaveCommand::DynSparkle {
            probability: buf.get_u16_le(),
        },
    };
    Ok(Command::slave(address, command))
}

fn decode_entity(opcode: u8, packet: &[u8]) -> Result<Command, DecodeError> {
    let (name, data_len) = match opcode {
        CMD_E_FILL_RGB => ("FILL_RGB", 3),
        CMD_E_FILL_D => ("FILL_D", 1),
        CMD_E_SHIFT_UP => ("SHIFT_UP", 5),
        CMD_E_SHIFT_DOWN => ("SHIFT_DOWN", 5),
        CMD_E_ROTATE => ("ROTATE", 2),
        CMD_E_RANDOMIZE => ("RANDOMIZE", 0),
        CMD_E_LOADONE => ("LOADONE", 5),
        _ => ("RAINBOW", 3),
    };
    expect_len(packet, name, ENTITY_HEADER_LEN + data_len)?;

    let mut buf = &packet[1..];
    let address = EntityMask::from_raw(buf.get_u16_le());
    let schedule = Schedule {
        repeat_count: buf.get_u8(),
        start_tick: buf.get_u16_le(),
        repeat_interval: buf.get_u16_le(),
    };
    let command = match opcode {
        CMD_E_FILL_RGB => EntityCommand::FillRgb {
            color: get_rgb(&mut buf),
        },
        CMD_E_FILL_D => EntityCommand::FillDynamics { flags: buf.get_u8() },
        CMD_E_SHIFT_UP => EntityCommand::ShiftUp {
            count: buf.get_u8(),
            color: get_rgb(&mut buf),
            dynamics: buf.get_u8(),
        },
        CMD_E_SHIFT_DOWN => EntityCommand::ShiftDown {
            count: buf.get_u8(),
            color: get_rgb(&mut buf),
            dynamics: buf.get_u8(),
        },
        CMD_E_ROTATE => EntityCommand::Rotate {
            count: buf.get_u8(),
            direction: buf.get_u8(),
        },
        CMD_E_RANDOMIZE => EntityCommand::Randomize,
        CMD_E_LOADONE => EntityCommand::LoadOne {
            index: buf.get_u8(),
            color: get_rgb(&mut buf),
            dynamics: buf.get_u8(),
        },
        _ => EntityCommand::Rainbow {
            start: buf.get_u8(),
            increment: buf.get_u8(),
            direction: buf.get_u8(),
        },
    };
    Ok(Command::entity(address, schedule, command))
}

fn decode_meta(packet: &[u8]) -> Result<Command, DecodeError> {
    let Some(&subcode) = packet.get(1) else {
        return Err(DecodeError::Length {
            command: "META",
            expected: 2,
            actual: packet.len(),
        });
    };
    let mut buf = &packet[2..];
    let command = match subcode {
        META_CONSOLE => {
            expect_len(packet, "META_CONSOLE", 4)?;
            MetaCommand::Console {
                value: buf.get_u16_le(),
            }
        }
        META_WAIT => {
            expect_len(packet, "META_WAIT", 4)?;
            MetaCommand::WaitForTick {
                tick: buf.get_u16_le(),
            }
        }
        META_ENDS => {
            expect_len(packet, "META_ENDS", 4)?;
            MetaCommand::EndsAtTick {
                tick: buf.get_u16_le(),
            }
        }
        META_RESET_TIME => {
            expect_len(packet, "META_RESET_TIME", 2)?;
            MetaCommand::ResetMasterClock
        }
        other => return Err(DecodeError::UnknownMetaCommand(other)),
    };
    Ok(Command::meta(command))
}

fn get_rgb(buf: &mut &[u8]) -> Rgb {
    Rgb::from_raw(buf.get_u8(), buf.get_u8(), buf.get_u8())
}

fn expect_len(packet: &[u8], command: &'static str, expected: usize) -> Result<(), DecodeError> {
    if packet.len() != expected {
        return Err(DecodeError::Length {
            command,
            expected,
            actual: packet.len(),
        });
    }
    Ok(())
}

fn expect_len_range(
    packet: &[u8],
    command: &'static str,
    min: usize,
    max: usize,
) -> Result<(), DecodeError> {
    if packet.len() < min || packet.len() > max {
        return Err(DecodeError::Length {
            command,
            expected: max,
            actual: packet.len(),
        });
    }
    Ok(())
}
