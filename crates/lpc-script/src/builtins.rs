//! Constants and functions every script can see.

use std::rc::Rc;

use lpc_packet::{EntityMask, Rgb, Schedule, DYN_BLINK, DYN_SPARKLE, DYN_THROB};

use crate::error::{Pos, Result, ScriptError};
use crate::interp::Interpreter;
use crate::value::{List, Value};

const FUNCTIONS: &[&str] = &[
    // emission
    "output",
    "comment",
    "console",
    "wait_for_tick",
    "ends_at_tick",
    "reset_master_clock",
    "reset_clock",
    "dyn_blink",
    "dyn_throb",
    "dyn_sparkle",
    "fill_rgb",
    "fill_dynamics",
    "shift_up",
    "shift_down",
    "rotate",
    "randomize",
    "load_one",
    "rainbow",
    // utility
    "seed",
    "random",
    "range",
    "len",
    "min",
    "max",
    "log",
];

pub(crate) fn is_builtin(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// Value of a predefined constant.
pub(crate) fn constant(name: &str) -> Option<Value> {
    if let Some(mask) = EntityMask::by_name(name) {
        return Some(Value::Int(i64::from(mask.bits())));
    }
    let flags = match name {
        "DYN_BLINK" => DYN_BLINK,
        "DYN_THROB" => DYN_THROB,
        "DYN_SPARKLE" => DYN_SPARKLE,
        _ => return None,
    };
    Some(Value::Int(i64::from(flags)))
}

struct Args<'a> {
    name: &'a str,
    values: Vec<Value>,
    pos: Pos,
}

impl Args<'_> {
    fn arity(&self, expected: usize) -> Result<()> {
        if self.values.len() != expected {
            return Err(self.arity_error(&expected.to_string()));
        }
        Ok(())
    }

    fn arity_error(&self, expected: &str) -> ScriptError {
        ScriptError::runtime(
            self.pos,
            format!(
                "`{}` takes {expected} argument(s), got {}",
                self.name,
                self.values.len()
            ),
        )
    }

    fn type_error(&self, index: usize, expected: &str) -> ScriptError {
        let found = self.values.get(index).map_or("nothing", Value::type_name);
        ScriptError::runtime(
            self.pos,
            format!(
                "argument {} of `{}` must be {expected}, found {found}",
                index + 1,
                self.name
            ),
        )
    }

    fn int(&self, index: usize) -> Result<i64> {
        match self.values.get(index) {
            Some(Value::Int(v)) => Ok(*v),
            _ => Err(self.type_error(index, "an int")),
        }
    }

    fn string(&self, index: usize) -> Result<Rc<str>> {
        match self.values.get(index) {
            Some(Value::Str(s)) => Ok(Rc::clone(s)),
            _ => Err(self.type_error(index, "a string")),
        }
    }

    fn address(&self, index: usize) -> Result<EntityMask> {
        EntityMask::from_bits(self.int(index)?).map_err(|err| ScriptError::program(self.pos, err))
    }

    fn schedule(&self, index: usize) -> Result<Schedule> {
        Schedule::new(
            self.int(index)?,
            self.int(index + 1)?,
            self.int(index + 2)?,
        )
        .map_err(|err| ScriptError::program(self.pos, err))
    }

    fn rgb(&self, index: usize) -> Result<Rgb> {
        Rgb::new(
            self.int(index)?,
            self.int(index + 1)?,
            self.int(index + 2)?,
        )
        .map_err(|err| ScriptError::program(self.pos, err))
    }
}

/// Call the builtin `name`.
pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    name: &str,
    values: Vec<Value>,
    pos: Pos,
) -> Result<Value> {
    let a = Args { name, values, pos };
    let host = |result: lpc_program::Result<()>| {
        result
            .map(|()| Value::None)
            .map_err(|err| ScriptError::program(pos, err))
    };
    let program = &mut *interp.program;

    match name {
        "output" => {
            a.arity(1)?;
            let file = a.string(0)?;
            host(program.set_output(&file).map(drop))
        }
        "comment" => {
            a.arity(1)?;
            let text = a.string(0)?;
            host(program.comment(&text))
        }
        "console" => {
            a.arity(1)?;
            host(program.console(a.int(0)?))
        }
        "wait_for_tick" => {
            a.arity(1)?;
            host(program.wait_for_tick(a.int(0)?))
        }
        "ends_at_tick" => {
            a.arity(1)?;
            host(program.ends_at_tick(a.int(0)?))
        }
        "reset_master_clock" => {
            a.arity(0)?;
            host(program.reset_master_clock())
        }
        "reset_clock" => {
            a.arity(1)?;
            host(program.reset_clock(a.address(0)?))
        }
        "dyn_blink" => {
            a.arity(4)?;
            host(program.dyn_blink(a.address(0)?, a.int(1)?, a.int(2)?, a.int(3)?))
        }
        "dyn_throb" => {
            a.arity(5)?;
            host(program.dyn_throb(
                a.address(0)?,
                a.int(1)?,
                a.int(2)?,
                a.int(3)?,
                a.int(4)?,
            ))
        }
        "dyn_sparkle" => {
            a.arity(2)?;
            host(program.dyn_sparkle(a.address(0)?, a.int(1)?))
        }
        "fill_rgb" => {
            a.arity(7)?;
            host(program.fill_rgb(a.address(0)?, a.schedule(1)?, a.rgb(4)?))
        }
        "fill_dynamics" => {
            a.arity(5)?;
            host(program.fill_dynamics(a.address(0)?, a.schedule(1)?, a.int(4)?))
        }
        "shift_up" | "shift_down" => {
            a.arity(9)?;
            let (address, schedule) = (a.address(0)?, a.schedule(1)?);
            let (count, color, dynamics) = (a.int(4)?, a.rgb(5)?, a.int(8)?);
            host(if name == "shift_up" {
                program.shift_up(address, schedule, count, color, dynamics)
            } else {
                program.shift_down(address, schedule, count, color, dynamics)
            })
        }
        "rotate" => {
            a.arity(6)?;
            host(program.rotate(a.address(0)?, a.schedule(1)?, a.int(4)?, a.int(5)?))
        }
        "randomize" => {
            a.arity(4)?;
            host(program.randomize(a.address(0)?, a.schedule(1)?))
        }
        "load_one" => {
            a.arity(9)?;
            host(program.load_one(
                a.address(0)?,
                a.schedule(1)?,
                a.int(4)?,
                a.rgb(5)?,
                a.int(8)?,
            ))
        }
        "rainbow" => {
            a.arity(7)?;
            host(program.rainbow(
                a.address(0)?,
                a.schedule(1)?,
                a.int(4)?,
                a.int(5)?,
                a.int(6)?,
            ))
        }

        "seed" => {
            a.arity(1)?;
            let seed = u64::try_from(a.int(0)?)
                .map_err(|_| ScriptError::runtime(pos, "seed must not be negative"))?;
            program.seed(seed);
            Ok(Value::None)
        }
        "random" => {
            let drawn = match a.values.len() {
                1 => program.random_below(a.int(0)?),
                2 => program.random_range(a.int(0)?, a.int(1)?),
                _ => return Err(a.arity_error("1 or 2")),
            };
            drawn
                .map(Value::Int)
                .map_err(|err| ScriptError::program(pos, err))
        }
        "range" => {
            let (start, end, step) = match a.values.len() {
                1 => (0, a.int(0)?, 1),
                2 => (a.int(0)?, a.int(1)?, 1),
                3 => (a.int(0)?, a.int(1)?, a.int(2)?),
                _ => return Err(a.arity_error("1 to 3")),
            };
            range(interp, start, end, step, pos)
        }
        "len" => {
            a.arity(1)?;
            let len = match &a.values[0] {
                Value::List(items) => items.len(),
                Value::Str(s) => s.len(),
                _ => return Err(a.type_error(0, "a list or string")),
            };
            i64::try_from(len)
                .map(Value::Int)
                .map_err(|_| ScriptError::runtime(pos, "length does not fit an int"))
        }
        "min" | "max" => {
            a.arity(2)?;
            let (x, y) = (a.int(0)?, a.int(1)?);
            Ok(Value::Int(if name == "min" { x.min(y) } else { x.max(y) }))
        }
        "log" => {
            a.arity(1)?;
            tracing::info!(line = pos.line, col = pos.col, "{}", a.values[0]);
            Ok(Value::None)
        }
        _ => Err(ScriptError::runtime(
            pos,
            format!("unknown function `{name}`"),
        )),
    }
}

fn range(interp: &Interpreter<'_>, start: i64, end: i64, step: i64, pos: Pos) -> Result<Value> {
    if step == 0 {
        return Err(ScriptError::runtime(pos, "range step must not be zero"));
    }
    let span = i128::from(end) - i128::from(start);
    let step_wide = i128::from(step);
    let count = if span == 0 || (span > 0) != (step > 0) {
        0
    } else {
        (span.abs() + step_wide.abs() - 1) / step_wide.abs()
    };
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    interp.check_list_len(count, pos)?;

    let mut items = Vec::with_capacity(count);
    let mut current = i128::from(start);
    for _ in 0..count {
        // Every element lies between start and end, so it fits an i64.
        items.push(Value::Int(current as i64));
        current += step_wide;
    }
    Ok(Value::List(Rc::new(List::new(items))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_wire_values() {
        assert_eq!(constant("ALL"), Some(Value::Int(0xFFFF)));
        assert_eq!(constant("DIAGS"), Some(Value::Int(0x00FF)));
        assert_eq!(constant("SIDES"), Some(Value::Int(0x0F00)));
        assert_eq!(constant("E_DIAG_3"), Some(Value::Int(0x0008)));
        assert_eq!(constant("E_FRONT"), Some(Value::Int(0x0800)));
        assert_eq!(constant("DYN_SPARKLE"), Some(Value::Int(4)));
        assert_eq!(constant("E_DIAG_8"), None);
    }

    #[test]
    fn builtin_names_are_not_constants() {
        for name in FUNCTIONS {
            assert!(constant(name).is_none(), "{name}");
        }
    }
}
