//! Protocol constants shared by the master firmware and the compiler.

// ============================================================================
// Slave command codes
// ============================================================================

/// Reset the slave's effect clock.
pub const CMD_S_RESET_CLOCK: u8 = 0x00;
/// Configure blink dynamics.
pub const CMD_S_DYN_BLINK: u8 = 0x01;
/// Configure throb dynamics.
pub const CMD_S_DYN_THROB: u8 = 0x02;
/// Configure sparkle dynamics.
pub const CMD_S_DYN_SPARKLE: u8 = 0x03;
/// Readable text carried in the stream for debugging; ignored by slaves.
pub const CMD_S_COMMENT: u8 = 0x04;

// ============================================================================
// Entity command codes
// ============================================================================

pub const CMD_E_FILL_RGB: u8 = 0xC0;
pub const CMD_E_FILL_D: u8 = 0xC1;
pub const CMD_E_SHIFT_UP: u8 = 0xC2;
pub const CMD_E_SHIFT_DOWN: u8 = 0xC3;
pub const CMD_E_ROTATE: u8 = 0xC4;
pub const CMD_E_RANDOMIZE: u8 = 0xC5;
pub const CMD_E_LOADONE: u8 = 0xC6;
pub const CMD_E_RAINBOW: u8 = 0xC7;

// ============================================================================
// Meta commands (interpreted by the master, never sent to slaves)
// ============================================================================

/// Command code that introduces a meta packet.
pub const META: u8 = 0xFF;
/// Show a value on the master's console display.
pub const META_CONSOLE: u8 = 0x00;
/// Hold the following packets until the given tick.
pub const META_WAIT: u8 = 0x01;
/// Declare the tick at which the program ends.
pub const META_ENDS: u8 = 0x02;
/// Reset the master's own notion of time.
pub const META_RESET_TIME: u8 = 0x03;

// ============================================================================
// Dynamics flags
// ============================================================================

/// Hard on/dim at some duty cycle and rate.
pub const DYN_BLINK: u8 = 0x01;
/// Soft brightness modulation at some duty cycle and rate.
pub const DYN_THROB: u8 = 0x02;
/// Full-on for one tick with some probability.
pub const DYN_SPARKLE: u8 = 0x04;

// ============================================================================
// Layout
// ============================================================================

/// Address bytes written for every comment packet.
pub const COMMENT_ADDRESS: u16 = 0xFFFF;
/// Longest comment text carried on the wire.
pub const COMMENT_MAX_LEN: usize = 11;
/// Bytes shared by every entity packet: opcode, address, repeat, start, interval.
pub const ENTITY_HEADER_LEN: usize = 8;
/// Longest valid slave or entity packet accepted by the firmware.
pub const PACKET_MAX: usize = 15;
