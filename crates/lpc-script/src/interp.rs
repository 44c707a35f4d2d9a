//! Tree-walking evaluator.

use std::collections::HashMap;
use std::rc::Rc;

use lpc_program::Program;

use crate::ast::{BinOp, Block, Expr, ExprKind, FnDecl, Script, Stmt, StmtKind, UnaryOp};
use crate::builtins;
use crate::error::{Pos, Result, ScriptError};
use crate::parser::parse_with_depth;
use crate::value::{List, Value};

/// Resource ceilings for one script run.
#[derive(Debug, Clone)]
pub struct ScriptLimits {
    /// Statements plus expressions evaluated.
    pub max_steps: u64,
    /// Nested user function calls.
    pub max_call_depth: usize,
    /// Nesting of expressions, blocks and list values. Applies to the parsed
    /// source and to live evaluation, which accumulates across calls.
    pub max_nesting_depth: usize,
    /// Elements in any single list.
    pub max_list_len: usize,
    /// Bytes in any single string.
    pub max_string_len: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_steps: 10_000_000,
            max_call_depth: 64,
            max_nesting_depth: 256,
            max_list_len: 1_000_000,
            max_string_len: 1 << 20,
        }
    }
}

/// Counters from a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub steps: u64,
}

/// Parse and run `source` against `program`.
///
/// The program is left open; the caller decides whether to `finish` it.
pub fn run_script(source: &str, program: &mut Program, limits: &ScriptLimits) -> Result<RunStats> {
    let script = parse_with_depth(source, limits.max_nesting_depth)?;
    run(&script, program, limits)
}

/// Run an already parsed script.
pub fn run(script: &Script, program: &mut Program, limits: &ScriptLimits) -> Result<RunStats> {
    tracing::debug!(
        functions = script.functions.len(),
        statements = script.body.len(),
        "running script"
    );
    let mut interp = Interpreter::new(program, limits.clone());
    for decl in &script.functions {
        interp.declare_fn(decl)?;
    }
    interp.exec_block(&script.body)?;
    tracing::debug!(steps = interp.steps, "script finished");
    Ok(RunStats { steps: interp.steps })
}

enum Flow {
    Next,
    Break,
    Continue,
    Return(Value),
}

pub(crate) struct Interpreter<'p> {
    pub(crate) program: &'p mut Program,
    pub(crate) limits: ScriptLimits,
    functions: HashMap<String, Rc<FnDecl>>,
    globals: HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
    steps: u64,
    depth: usize,
}

impl<'p> Interpreter<'p> {
    fn new(program: &'p mut Program, limits: ScriptLimits) -> Self {
        Self {
            program,
            limits,
            functions: HashMap::new(),
            globals: HashMap::new(),
            frames: Vec::new(),
            steps: 0,
            depth: 0,
        }
    }

    fn declare_fn(&mut self, decl: &Rc<FnDecl>) -> Result<()> {
        if builtins::is_builtin(&decl.name) || builtins::constant(&decl.name).is_some() {
            return Err(ScriptError::runtime(
                decl.pos,
                format!("function `{}` shadows a builtin", decl.name),
            ));
        }
        self.functions.insert(decl.name.clone(), Rc::clone(decl));
        Ok(())
    }

    fn tick(&mut self, pos: Pos) -> Result<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ScriptError::limit(
                pos,
                format!("more than {} evaluation steps", self.limits.max_steps),
            ));
        }
        Ok(())
    }

    fn enter(&mut self, pos: Pos) -> Result<()> {
        if self.depth >= self.limits.max_nesting_depth {
            return Err(ScriptError::limit(
                pos,
                format!("nesting deeper than {}", self.limits.max_nesting_depth),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn check_list_len(&self, len: usize, pos: Pos) -> Result<()> {
        if len > self.limits.max_list_len {
            return Err(ScriptError::limit(
                pos,
                format!(
                    "list of {len} elements exceeds the maximum of {}",
                    self.limits.max_list_len
                ),
            ));
        }
        Ok(())
    }

    fn check_string_len(&self, len: usize, pos: Pos) -> Result<()> {
        if len > self.limits.max_string_len {
            return Err(ScriptError::limit(
                pos,
                format!(
                    "string of {len} bytes exceeds the maximum of {}",
                    self.limits.max_string_len
                ),
            ));
        }
        Ok(())
    }

    fn list(&self, items: Vec<Value>, pos: Pos) -> Result<Value> {
        let list = List::new(items);
        if list.depth() > self.limits.max_nesting_depth {
            return Err(ScriptError::limit(
                pos,
                format!(
                    "list nested deeper than {}",
                    self.limits.max_nesting_depth
                ),
            ));
        }
        Ok(Value::List(Rc::new(list)))
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    fn lookup(&self, name: &str, pos: Pos) -> Result<Value> {
        if let Some(value) = self.frames.last().and_then(|frame| frame.get(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        builtins::constant(name)
            .ok_or_else(|| ScriptError::runtime(pos, format!("undefined variable `{name}`")))
    }

    fn declare(&mut self, name: &str, value: Value, pos: Pos) -> Result<()> {
        if builtins::constant(name).is_some() {
            return Err(ScriptError::runtime(
                pos,
                format!("cannot redefine constant `{name}`"),
            ));
        }
        let scope = match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        };
        scope.insert(name.to_string(), value);
        Ok(())
    }

    fn slot(&mut self, name: &str, pos: Pos) -> Result<&mut Value> {
        if let Some(value) = self.frames.last_mut().and_then(|frame| frame.get_mut(name)) {
            return Ok(value);
        }
        if builtins::constant(name).is_some() {
            return Err(ScriptError::runtime(
                pos,
                format!("cannot assign to constant `{name}`"),
            ));
        }
        self.globals.get_mut(name).ok_or_else(|| {
            ScriptError::runtime(
                pos,
                format!("assignment to undeclared variable `{name}`; use `let`"),
            )
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec_block(&mut self, block: &Block) -> Result<Flow> {
        for stmt in block {
            match self.exec(stmt)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.tick(stmt.pos)?;
        self.enter(stmt.pos)?;
        let flow = self.exec_kind(stmt);
        self.depth -= 1;
        flow
    }

    fn exec_kind(&mut self, stmt: &Stmt) -> Result<Flow> {
        match &stmt.kind {
            StmtKind::Let(name, value) => {
                let value = self.eval(value)?;
                self.declare(name, value, stmt.pos)?;
            }
            StmtKind::Assign(name, op, value) => {
                let rhs = self.eval(value)?;
                let new = match op {
                    None => rhs,
                    Some(op) => {
                        let current = self.lookup(name, stmt.pos)?;
                        self.binary(*op, current, rhs, stmt.pos)?
                    }
                };
                *self.slot(name, stmt.pos)? = new;
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::If(branches, otherwise) => {
                for (cond, body) in branches {
                    if self.condition(cond)? {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = otherwise {
                    return self.exec_block(body);
                }
            }
            StmtKind::For(name, iter, body) => {
                let items = match self.eval(iter)? {
                    Value::List(items) => items,
                    other => {
                        return Err(ScriptError::runtime(
                            iter.pos,
                            format!("cannot iterate over {}", other.type_name()),
                        ))
                    }
                };
                for item in items.items() {
                    self.declare(name, item.clone(), stmt.pos)?;
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Next | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            StmtKind::While(cond, body) => {
                while self.condition(cond)? {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Next | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(Flow::Next)
    }

    fn condition(&mut self, expr: &Expr) -> Result<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(ScriptError::runtime(
                expr.pos,
                format!("condition must be bool, found {}", other.type_name()),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        self.tick(expr.pos)?;
        self.enter(expr.pos)?;
        let value = self.eval_kind(expr);
        self.depth -= 1;
        value
    }

    fn eval_kind(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Int(v) => Ok(Value::Int(*v)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Str(s) => Ok(Value::Str(Rc::from(s.as_str()))),
            ExprKind::List(items) => {
                self.check_list_len(items.len(), expr.pos)?;
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>>>()?;
                self.list(values, expr.pos)
            }
            ExprKind::Var(name) => self.lookup(name, expr.pos),
            ExprKind::Unary(op, operand) => {
                let value = self.eval(operand)?;
                unary(*op, value, expr.pos)
            }
            ExprKind::Binary(BinOp::And, lhs, rhs) => {
                Ok(Value::Bool(self.condition(lhs)? && self.condition(rhs)?))
            }
            ExprKind::Binary(BinOp::Or, lhs, rhs) => {
                Ok(Value::Bool(self.condition(lhs)? || self.condition(rhs)?))
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(*op, lhs, rhs, expr.pos)
            }
            ExprKind::Call(name, args) => self.call(name, args, expr.pos),
            ExprKind::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                match (target, index) {
                    (Value::List(items), Value::Int(i)) => usize::try_from(i)
                        .ok()
                        .and_then(|i| items.items().get(i))
                        .cloned()
                        .ok_or_else(|| {
                            ScriptError::runtime(
                                expr.pos,
                                format!(
                                    "index {i} out of range for list of length {}",
                                    items.len()
                                ),
                            )
                        }),
                    (target, index) => Err(ScriptError::runtime(
                        expr.pos,
                        format!(
                            "cannot index {} with {}",
                            target.type_name(),
                            index.type_name()
                        ),
                    )),
                }
            }
        }
    }

    fn call(&mut self, name: &str, arg_exprs: &[Expr], pos: Pos) -> Result<Value> {
        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.eval(arg)?);
        }

        let Some(decl) = self.functions.get(name).cloned() else {
            return builtins::call(self, name, args, pos);
        };
        if args.len() != decl.params.len() {
            return Err(ScriptError::runtime(
                pos,
                format!(
                    "`{name}` takes {} argument(s), got {}",
                    decl.params.len(),
                    args.len()
                ),
            ));
        }
        if self.frames.len() >= self.limits.max_call_depth {
            return Err(ScriptError::limit(
                pos,
                format!("call depth exceeds {}", self.limits.max_call_depth),
            ));
        }

        self.frames
            .push(decl.params.iter().cloned().zip(args).collect());
        let flow = self.exec_block(&decl.body);
        self.frames.pop();
        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }

    pub(crate) fn binary(&self, op: BinOp, lhs: Value, rhs: Value, pos: Pos) -> Result<Value> {
        let overflow = || ScriptError::runtime(pos, format!("integer overflow in `{}`", op.symbol()));
        match (op, lhs, rhs) {
            (BinOp::Eq, l, r) => Ok(Value::Bool(l == r)),
            (BinOp::Ne, l, r) => Ok(Value::Bool(l != r)),
            (BinOp::Add, Value::Str(l), Value::Str(r)) => {
                self.check_string_len(l.len() + r.len(), pos)?;
                Ok(Value::Str(Rc::from(format!("{l}{r}").as_str())))
            }
            (BinOp::Add, Value::List(l), Value::List(r)) => {
                self.check_list_len(l.len() + r.len(), pos)?;
                let mut joined = Vec::with_capacity(l.len() + r.len());
                joined.extend(l.items().iter().cloned());
                joined.extend(r.items().iter().cloned());
                self.list(joined, pos)
            }
            (op, Value::Int(l), Value::Int(r)) => {
                let value = match op {
                    BinOp::Add => l.checked_add(r).ok_or_else(overflow)?,
                    BinOp::Sub => l.checked_sub(r).ok_or_else(overflow)?,
                    BinOp::Mul => l.checked_mul(r).ok_or_else(overflow)?,
                    BinOp::Div | BinOp::Rem if r == 0 => {
                        return Err(ScriptError::runtime(pos, "division by zero"))
                    }
                    BinOp::Div => l.checked_div(r).ok_or_else(overflow)?,
                    BinOp::Rem => l.checked_rem(r).ok_or_else(overflow)?,
                    BinOp::BitOr => l | r,
                    BinOp::BitXor => l ^ r,
                    BinOp::BitAnd => l & r,
                    BinOp::Shl | BinOp::Shr => {
                        let amount = u32::try_from(r)
                            .ok()
                            .filter(|amount| *amount < 64)
                            .ok_or_else(|| {
                                ScriptError::runtime(pos, format!("shift amount {r} out of range"))
                            })?;
                        if op == BinOp::Shl {
                            l << amount
                        } else {
                            l >> amount
                        }
                    }
                    BinOp::Lt => return Ok(Value::Bool(l < r)),
                    BinOp::Le => return Ok(Value::Bool(l <= r)),
                    BinOp::Gt => return Ok(Value::Bool(l > r)),
                    BinOp::Ge => return Ok(Value::Bool(l >= r)),
                    BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or => {
                        return Err(type_error(op, "int", "int", pos))
                    }
                };
                Ok(Value::Int(value))
            }
            (op, l, r) => Err(type_error(op, l.type_name(), r.type_name(), pos)),
        }
    }
}

fn unary(op: UnaryOp, value: Value, pos: Pos) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ScriptError::runtime(pos, "integer overflow in `-`")),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(ScriptError::runtime(
            pos,
            format!("cannot negate {}", other.type_name()),
        )),
        (UnaryOp::Not, other) => Err(ScriptError::runtime(
            pos,
            format!("cannot apply `!` to {}", other.type_name()),
        )),
    }
}

fn type_error(op: BinOp, lhs: &str, rhs: &str, pos: Pos) -> ScriptError {
    ScriptError::runtime(
        pos,
        format!("unsupported operands for `{}`: {lhs} and {rhs}", op.symbol()),
    )
}

#[cfg(test)]
mod tests {
    use lpc_frame::FrameReader;
    use lpc_packet::{decode_command, Command, EntityMask, MetaCommand};
    use lpc_program::{MemorySink, ProgramConfig, ProgramError};

    use super::*;

    fn program(seed: u64) -> (Program, MemorySink) {
        let sink = MemorySink::new();
        let mut program = Program::new(ProgramConfig {
            seed,
            ..ProgramConfig::default()
        });
        program.set_output_sink(Box::new(sink.clone())).unwrap();
        (program, sink)
    }

    fn compile(source: &str) -> Vec<Command> {
        let (mut program, sink) = program(0);
        run_script(source, &mut program, &ScriptLimits::default()).unwrap();
        decode(sink.contents())
    }

    fn decode(wire: Vec<u8>) -> Vec<Command> {
        FrameReader::new(std::io::Cursor::new(wire))
            .read_all()
            .unwrap()
            .iter()
            .map(|payload| decode_command(payload).unwrap())
            .collect()
    }

    fn fails(source: &str) -> ScriptError {
        let (mut program, _) = program(0);
        run_script(source, &mut program, &ScriptLimits::default()).unwrap_err()
    }

    fn ticks(commands: &[Command]) -> Vec<u16> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Meta {
                    command: MetaCommand::WaitForTick { tick },
                } => Some(*tick),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn known_vectors_through_script() {
        let (mut program, sink) = program(0);
        run_script(
            r#"
            comment("Mark");
            reset_clock(ALL);
            fill_rgb(ALL, 1, 0, 0, 255, 0, 0);
            wait_for_tick(300);
            "#,
            &mut program,
            &ScriptLimits::default(),
        )
        .unwrap();

        let mut expected = vec![0xC0, 0x04, 0xFF, 0xFF, b'M', b'a', b'r', b'k', 0xC0];
        expected.extend([0xC0, 0x00, 0xFF, 0xFF, 0xC0]);
        expected.extend([
            0xC0, 0xDB, 0xDC, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0xC0,
        ]);
        expected.extend([0xC0, 0xFF, 0x01, 0x2C, 0x01, 0xC0]);
        assert_eq!(sink.contents(), expected);
    }

    #[test]
    fn loops_functions_and_globals() {
        let commands = compile(
            r#"
            let interval = 7;
            let emitted = 0;

            fn at(rain) {
                emitted += 1;
                return rain * 21 * interval;
            }

            for rain in range(3) {
                wait_for_tick(at(rain));
            }
            let i = 0;
            while true {
                i += 1;
                if i == 2 { continue; } else if i > 3 { break; }
                console(i);
            }
            console(emitted);
            "#,
        );
        assert_eq!(ticks(&commands), vec![0, 147, 294]);
        let consoles: Vec<u16> = commands
            .iter()
            .filter_map(|command| match command {
                Command::Meta {
                    command: MetaCommand::Console { value },
                } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(consoles, vec![1, 3, 3]);
    }

    #[test]
    fn wheel_function_in_script() {
        let commands = compile(
            r#"
            fn red(v) {
                if v < 85 { return v * 3; }
                else if v < 170 { return 255 - (v - 85) * 3; }
                return 0;
            }
            for v in [0, 84, 85, 169, 170] { console(red(v)); }
            "#,
        );
        let values: Vec<u16> = commands
            .iter()
            .map(|command| match command {
                Command::Meta {
                    command: MetaCommand::Console { value },
                } => *value,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(values, vec![0, 252, 255, 3, 0]);
    }

    #[test]
    fn constants_combine_as_masks() {
        let commands = compile("reset_clock(E_DIAG_0 | E_DIAG_7 | E_FRONT);");
        assert_eq!(
            commands[0].address(),
            Some(EntityMask::DIAG_0 | EntityMask::DIAG_7 | EntityMask::FRONT)
        );
    }

    #[test]
    fn locals_do_not_leak() {
        let err = fails("fn f() { let hidden = 1; } f(); console(hidden);");
        assert!(err.to_string().contains("undefined variable `hidden`"));
    }

    #[test]
    fn same_seed_same_packets() {
        let source = r#"
            seed(1234);
            for i in range(20) {
                let x = random(256);
                shift_down(DIAGS, 3, i * 10, 7, 1, x, 255 - x, random(10, 20), 0);
            }
        "#;
        let run = |seed| {
            let (mut program, sink) = program(seed);
            run_script(source, &mut program, &ScriptLimits::default()).unwrap();
            sink.contents()
        };
        assert_eq!(run(0), run(99));
        assert_eq!(decode(run(0)).len(), 20);
    }

    #[test]
    fn host_seed_drives_random_without_script_seed() {
        let source = "console(random(65536));";
        let run = |seed| {
            let (mut program, sink) = program(seed);
            run_script(source, &mut program, &ScriptLimits::default()).unwrap();
            sink.contents()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn field_overflow_is_a_positioned_encoding_error() {
        let err = fails("console(1);\nfill_rgb(ALL, 1, 0, 0, 256, 0, 0);");
        assert_eq!(err.pos(), Pos::new(2, 1));
        assert!(matches!(
            err.program_error(),
            Some(ProgramError::Encode(_))
        ));
        assert!(err.to_string().contains("red"));
    }

    #[test]
    fn emission_without_output_is_a_configuration_error() {
        let mut program = Program::new(ProgramConfig::default());
        let err = run_script("reset_clock(ALL);", &mut program, &ScriptLimits::default())
            .unwrap_err();
        assert!(err.program_error().is_some_and(ProgramError::is_configuration));
    }

    #[test]
    fn runtime_faults() {
        let cases = [
            ("console(1 / 0);", "division by zero"),
            ("console(9223372036854775807 + 1);", "overflow"),
            ("console([1, 2][2]);", "out of range"),
            ("console(-[1][0 - 1]);", "out of range"),
            ("if 1 { }", "condition must be bool"),
            ("nope();", "unknown function"),
            ("x = 1;", "undeclared variable"),
            ("ALL = 1;", "constant"),
            ("let DIAGS = 1;", "constant"),
            ("fn range(n) { } ", "shadows a builtin"),
            ("fill_rgb(ALL, 1, 0, 0, 255, 0);", "takes 7 argument(s), got 6"),
            ("comment(5);", "must be a string"),
            ("random(0);", "random range is empty"),
            ("range(1, 2, 0);", "step must not be zero"),
            ("console(1 << 64);", "shift amount"),
            ("console(\"a\" - 1);", "unsupported operands"),
            ("fn f(a) { } f();", "takes 1 argument(s), got 0"),
        ];
        for (source, needle) in cases {
            let err = fails(source);
            assert!(
                err.to_string().contains(needle),
                "{source:?} gave {err}, expected {needle:?}"
            );
        }
    }

    #[test]
    fn step_limit_stops_runaway_loops() {
        let (mut program, _) = program(0);
        let limits = ScriptLimits {
            max_steps: 1_000,
            ..ScriptLimits::default()
        };
        let err = run_script("while true { }", &mut program, &limits).unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
    }

    #[test]
    fn call_depth_limit_stops_runaway_recursion() {
        let err = fails("fn f(n) { return f(n + 1); } f(0);");
        assert!(matches!(err, ScriptError::Limit { .. }));
        assert!(err.to_string().contains("call depth"));
    }

    #[test]
    fn nesting_limit_covers_source_lists_and_evaluation() {
        let limits = ScriptLimits {
            max_nesting_depth: 32,
            ..ScriptLimits::default()
        };

        let (mut program, sink) = program(0);
        let source = format!("console({}1{});", "(".repeat(40), ")".repeat(40));
        let err = run_script(&source, &mut program, &limits).unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
        assert!(sink.contents().is_empty());

        let err = run_script(
            "let l = [];\nfor i in range(100) { l = [l]; }",
            &mut program,
            &limits,
        )
        .unwrap_err();
        assert!(err.to_string().contains("list nested deeper than 32"));
        assert_eq!(err.pos().line, 2);

        let pos = Pos::new(1, 1);
        let mut expr = Expr {
            kind: ExprKind::Bool(true),
            pos,
        };
        for _ in 0..100 {
            expr = Expr {
                kind: ExprKind::Unary(UnaryOp::Not, Box::new(expr)),
                pos,
            };
        }
        let script = Script {
            functions: Vec::new(),
            body: vec![Stmt {
                kind: StmtKind::Expr(expr),
                pos,
            }],
        };
        let err = run(&script, &mut program, &limits).unwrap_err();
        assert!(err.to_string().contains("nesting deeper than 32"));
    }

    #[test]
    fn string_limit_stops_doubling() {
        let (mut program, _) = program(0);
        let limits = ScriptLimits {
            max_string_len: 1024,
            ..ScriptLimits::default()
        };
        let err = run_script(
            r#"let s = "ab"; while true { s = s + s; }"#,
            &mut program,
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
        assert!(err.to_string().contains("string of 2048 bytes"));

        let tight = ScriptLimits {
            max_string_len: 3,
            ..ScriptLimits::default()
        };
        let err = run_script(r#"let t = "ab"; t += t;"#, &mut program, &tight).unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
    }

    #[test]
    fn list_limit_applies_before_allocation() {
        let (mut program, _) = program(0);
        let limits = ScriptLimits {
            max_list_len: 10,
            ..ScriptLimits::default()
        };
        let err = run_script("let big = range(0x7FFF_FFFF_FFFF);", &mut program, &limits)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
        let err = run_script("let l = range(6) + range(6);", &mut program, &limits).unwrap_err();
        assert!(matches!(err, ScriptError::Limit { .. }));
    }

    #[test]
    fn utilities() {
        let commands = compile(
            r#"
            let xs = range(10, 0, -3);
            console(len(xs));
            console(xs[3]);
            console(min(4, 9) + max(4, 9));
            console(len("abc") + len([]));
            if "a" + "b" == "ab" && !false { console(0b1010 ^ 0xF); }
            log(xs);
            "#,
        );
        let values: Vec<u16> = commands
            .iter()
            .filter_map(|command| match command {
                Command::Meta {
                    command: MetaCommand::Console { value },
                } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![4, 1, 13, 3, 5]);
    }

    #[test]
    fn stats_count_steps() {
        let (mut program, _) = program(0);
        let stats = run_script("let a = 1;", &mut program, &ScriptLimits::default()).unwrap();
        assert_eq!(stats.steps, 2);
    }
}
