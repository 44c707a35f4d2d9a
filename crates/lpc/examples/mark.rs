//! Builds the lamp-test program with the Rust API instead of a show script.
//!
//! Every pixel cycles red, black, green, black, blue, black.
//!
//! ```text
//! cargo run -p lpc --example mark -- /tmp
//! ```

use std::path::PathBuf;

use lpc::packet::{EntityMask, Rgb, Schedule};
use lpc::program::{Program, ProgramConfig, Result};

fn main() -> Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    let mut program = Program::new(ProgramConfig {
        output_dir,
        ..ProgramConfig::default()
    });
    program.set_output("MARK.PKT")?;
    program.comment("Mark")?;
    program.reset_clock(EntityMask::ALL)?;
    program.reset_master_clock()?;
    program.fill_dynamics(EntityMask::ALL, Schedule::once(0), 0)?;

    let red = Rgb::new(255, 0, 0)?;
    let green = Rgb::new(0, 255, 0)?;
    let blue = Rgb::new(0, 0, 255)?;
    program.fill_rgb(EntityMask::ALL, Schedule::new(1, 0, 300)?, red)?;
    program.fill_rgb(EntityMask::ALL, Schedule::new(3, 50, 100)?, Rgb::BLACK)?;
    program.fill_rgb(EntityMask::ALL, Schedule::new(1, 100, 300)?, green)?;
    program.fill_rgb(EntityMask::ALL, Schedule::new(1, 200, 300)?, blue)?;
    program.ends_at_tick(3 * 100)?;

    let summary = program.finish()?;
    if let Some(path) = summary.output {
        println!(
            "wrote {} packets ({} bytes) to {}",
            summary.packets,
            summary.bytes,
            path.display()
        );
    }
    Ok(())
}
