//! Execution engine.
//!
//! Instruction actions never touch engine state directly: they read operands
//! (which pops when the operand is `$sp`) and return an [`Effect`] that the
//! [`Cpu`] applies. Programs run either all at once or one step per call.

use crate::binary::arith::{self, bounds_check, clamp_to_zero, floor_div, overflow_wrap, LimitError};
use crate::cpu::decode::{Instruction, Mnemonic, Operands};
use crate::cpu::memory::{VariableCell, VariableTable};
use crate::cpu::program::Program;
use crate::cpu::registers::{RegisterId, RegisterValue, Registers};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Text appended to the trace when a step sequence is stopped.
pub const TERMINATION_MARKER: &str = "\n---- User termination ----\n";

/// A register update produced by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    Store(RegisterId, i32),
    Reset(RegisterId),
}

/// Everything an instruction changes besides operand reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effect {
    pub register: Option<RegisterWrite>,
    pub variable: Option<(String, i32)>,
}

impl Effect {
    pub fn store(id: RegisterId, value: i32) -> Self {
        Self { register: Some(RegisterWrite::Store(id, value)), variable: None }
    }

    pub fn reset(id: RegisterId) -> Self {
        Self { register: Some(RegisterWrite::Reset(id)), variable: None }
    }

    pub fn variable(name: String, value: i32) -> Self {
        Self { register: None, variable: Some((name, value)) }
    }
}

fn divide(dividend: i64, divisor: i64) -> Result<i32, RuntimeError> {
    if divisor == 0 {
        return Err(RuntimeError::DivideByZero);
    }
    Ok(bounds_check(floor_div(dividend, divisor))?)
}

fn resolve_variable(vars: &VariableTable, name: Option<&str>, address: u16) -> Result<String, RuntimeError> {
    match name {
        Some(name) if vars.contains(name) => Ok(name.to_string()),
        Some(name) => Err(RuntimeError::UndefinedVariable(name.to_string())),
        None => vars
            .name_at(address)
            .map(str::to_string)
            .ok_or_else(|| RuntimeError::UndefinedVariable(format!("@{:#06x}", address))),
    }
}

impl Instruction {
    /// Run this instruction's action.
    ///
    /// Operand reads happen here, so popping `$sp` is visible in `regs`
    /// even when the action fails. Writes are returned, not applied.
    pub fn execute(&self, regs: &mut Registers, vars: &VariableTable) -> Result<Effect, RuntimeError> {
        use Mnemonic::*;

        let m = self.mnemonic();
        let effect = match *self.operands() {
            Operands::ThreeReg { dest, first, second } => {
                let a = i64::from(regs.read(first));
                let b = i64::from(regs.read(second));
                let value = match m {
                    Add => bounds_check(a + b)?,
                    Sub => bounds_check(a - b)?,
                    Mul => bounds_check(a * b)?,
                    Addo => overflow_wrap(a + b),
                    Subo => overflow_wrap(a - b),
                    Mulo => overflow_wrap(a * b),
                    And => (a & b) as i32,
                    Or => clamp_to_zero(a | b),
                    Xor => clamp_to_zero(a ^ b),
                    Div => divide(a, b)?,
                    Diff => bounds_check((a.abs() - b.abs()).abs())?,
                    Expo => arith::power(a as i32, b as i32)?,
                    _ => unreachable!("{} is not a three-register instruction", m),
                };
                Effect::store(dest, value)
            }

            Operands::TwoReg { first, second } => match m {
                Abs | Neg | Sqrt | Cp => {
                    let src = regs.read(second);
                    let value = match m {
                        Abs => bounds_check(i64::from(src).abs())?,
                        Neg => bounds_check(-i64::from(src))?,
                        Sqrt => arith::isqrt(src).ok_or(RuntimeError::NegativeSquareRoot(src))?,
                        _ => src,
                    };
                    Effect::store(first, value)
                }
                Eq | Gt | Gte | Lt | Lte | Neq => {
                    let a = regs.read(first);
                    let b = regs.read(second);
                    let flag = match m {
                        Eq => a == b,
                        Gt => a > b,
                        Gte => a >= b,
                        Lt => a < b,
                        Lte => a <= b,
                        _ => a != b,
                    };
                    Effect::store(RegisterId::Rb, i32::from(flag))
                }
                _ => {
                    let a = i64::from(regs.read(first));
                    let b = i64::from(regs.read(second));
                    let value = match m {
                        Adds => bounds_check(a + b)?,
                        Subs => bounds_check(a - b)?,
                        Muls => bounds_check(a * b)?,
                        Addso => overflow_wrap(a + b),
                        Subso => overflow_wrap(a - b),
                        Mulso => overflow_wrap(a * b),
                        _ => unreachable!("{} is not a two-register instruction", m),
                    };
                    Effect::store(RegisterId::Sp, value)
                }
            },

            Operands::TwoRegOneI { dest, src, imm } => {
                let a = regs.read(src);
                let (wide, wide_imm) = (i64::from(a), i64::from(imm));
                let value = match m {
                    Addi => bounds_check(wide + wide_imm)?,
                    Subi => bounds_check(wide - wide_imm)?,
                    Muli => bounds_check(wide * wide_imm)?,
                    Divi => divide(wide, wide_imm)?,
                    Expoi => arith::power(a, imm)?,
                    Lshift => clamp_to_zero(arith::shift_left(a, imm)),
                    Rshift => arith::shift_right(a, imm),
                    _ => unreachable!("{} is not a register-immediate instruction", m),
                };
                Effect::store(dest, value)
            }

            Operands::OneReg { reg } => match m {
                Push => Effect::store(RegisterId::Sp, regs.read(reg)),
                Pop => Effect::store(reg, regs.read(RegisterId::Sp)),
                Inc => Effect::store(reg, bounds_check(i64::from(regs.read(reg)) + 1)?),
                Dec => Effect::store(reg, bounds_check(i64::from(regs.read(reg)) - 1)?),
                Zero => Effect::reset(reg),
                Addfs | Subfs | Mulfs | Divs => {
                    // Exactly two pops: the top of the stack is the left operand
                    let first = i64::from(regs.read(RegisterId::Sp));
                    let second = i64::from(regs.read(RegisterId::Sp));
                    let value = match m {
                        Addfs => bounds_check(first + second)?,
                        Subfs => bounds_check(first - second)?,
                        Mulfs => bounds_check(first * second)?,
                        _ => divide(first, second)?,
                    };
                    Effect::store(reg, value)
                }
                _ => unreachable!("{} is not a one-register instruction", m),
            },

            Operands::OneRegOneI { dest, imm } => Effect::store(dest, imm),

            Operands::Memory { reg, ref name, address } => {
                let name = resolve_variable(vars, name.as_deref(), address)?;
                match m {
                    Lw => {
                        let value = vars
                            .get(&name)
                            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
                        Effect::store(reg, value)
                    }
                    _ => Effect::variable(name, regs.read(reg)),
                }
            }
        };

        Ok(effect)
    }
}

/// Engine state, as seen by the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Nothing has run since the program was loaded.
    Idle,
    /// Partway through a step sequence.
    Stepping,
    /// The last run or step sequence completed.
    Finished,
    /// The last run or step sequence hit a runtime error.
    Faulted,
    /// The step sequence was stopped by the user.
    Stopped,
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// More instructions remain; `next` is the index of the next one.
    Continue { next: usize },
    /// The final instruction ran; the next step starts over.
    Finished,
}

/// Everything the register, memory and console views display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: Vec<RegisterValue>,
    pub variables: Vec<VariableCell>,
    pub trace: String,
    pub state: CpuState,
    pub cursor: usize,
}

/// The simulated machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Register file.
    pub regs: Registers,
    /// Live variable table.
    pub vars: VariableTable,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed in the current run or step sequence.
    pub cycles: u64,
    program: Program,
    cursor: usize,
    trace: String,
    last_index: Option<usize>,
}

impl Cpu {
    /// Create a machine with no program.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            vars: VariableTable::new(),
            state: CpuState::Idle,
            cycles: 0,
            program: Program::new(),
            cursor: 0,
            trace: String::new(),
            last_index: None,
        }
    }

    /// Replace the loaded program. Registers keep their values until the
    /// next run or step sequence begins.
    pub fn load(&mut self, program: Program) {
        self.vars = program.variables.clone();
        self.program = program;
        self.cursor = 0;
        self.state = CpuState::Idle;
        self.last_index = None;
    }

    /// Reset registers, variables and trace to their starting state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.vars = self.program.variables.clone();
        self.trace.clear();
        self.cursor = 0;
        self.cycles = 0;
        self.state = CpuState::Idle;
        self.last_index = None;
    }

    /// Run the whole program from the start.
    ///
    /// Returns the number of instructions executed. On a runtime error the
    /// remaining instructions are skipped and the message is appended to
    /// the trace.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        if self.program.is_empty() {
            return Err(CpuError::EmptyProgram);
        }

        self.reset();

        for index in 0..self.program.len() {
            if let Err(e) = self.execute_at(index) {
                self.fault(&e);
                return Err(e.into());
            }
        }

        self.state = CpuState::Finished;
        log::info!("run finished after {} instructions", self.cycles);
        Ok(self.cycles)
    }

    /// Execute the next instruction of a step sequence.
    ///
    /// The first step of a sequence resets the machine. Finishing the last
    /// instruction, or failing any, ends the sequence so the next call
    /// starts over.
    pub fn step(&mut self) -> Result<StepStatus, CpuError> {
        if self.program.is_empty() {
            return Err(CpuError::EmptyProgram);
        }

        if self.cursor == 0 {
            self.reset();
            self.state = CpuState::Stepping;
        }

        let index = self.cursor;
        if let Err(e) = self.execute_at(index) {
            self.cursor = 0;
            self.fault(&e);
            return Err(e.into());
        }

        if index + 1 == self.program.len() {
            self.cursor = 0;
            self.state = CpuState::Finished;
            log::info!("step sequence finished after {} instructions", self.cycles);
            return Ok(StepStatus::Finished);
        }

        self.cursor = index + 1;
        Ok(StepStatus::Continue { next: self.cursor })
    }

    /// Abort an in-progress step sequence.
    ///
    /// Returns false, changing nothing, if no sequence is in progress.
    pub fn stop(&mut self) -> bool {
        if self.state != CpuState::Stepping {
            return false;
        }

        self.trace.push_str(TERMINATION_MARKER);
        self.cursor = 0;
        self.state = CpuState::Stopped;
        log::warn!("step sequence stopped after {} instructions", self.cycles);
        true
    }

    fn execute_at(&mut self, index: usize) -> Result<(), RuntimeError> {
        let entry = &self.program.instructions[index];
        log::debug!("execute [{}] {}", index, entry.text());

        let effect = entry.instruction().execute(&mut self.regs, &self.vars)?;
        let line = entry.trace_line();

        self.apply(effect);
        self.trace.push_str(&line);
        self.cycles += 1;
        self.last_index = Some(index);
        Ok(())
    }

    fn apply(&mut self, effect: Effect) {
        match effect.register {
            Some(RegisterWrite::Store(id, value)) => self.regs.write(id, value),
            Some(RegisterWrite::Reset(id)) => self.regs.reset_one(id),
            None => {}
        }

        if let Some((name, value)) = effect.variable {
            self.vars.set(&name, value);
        }
    }

    fn fault(&mut self, error: &RuntimeError) {
        log::warn!("runtime error after {} instructions: {}", self.cycles, error);
        self.trace.push_str(&error.to_string());
        self.state = CpuState::Faulted;
    }

    /// Accumulated trace text.
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Index of the instruction the next step will execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the most recently executed instruction.
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Check if a step sequence is in progress.
    pub fn is_stepping(&self) -> bool {
        self.state == CpuState::Stepping
    }

    /// Run is unavailable while stepping.
    pub fn can_run(&self) -> bool {
        !self.is_stepping()
    }

    /// Stop is only available while stepping.
    pub fn can_stop(&self) -> bool {
        self.is_stepping()
    }

    /// Current state of every view.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: self.regs.snapshot(),
            variables: self.vars.snapshot(),
            trace: self.trace.clone(),
            state: self.state,
            cursor: self.cursor,
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("cursor", &self.cursor)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors raised by an instruction while it executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error("Divide by zero exception")]
    DivideByZero,

    #[error("Cannot take the square root of a negative number: {0}")]
    NegativeSquareRoot(i32),

    #[error("The variable {0} is not defined")]
    UndefinedVariable(String),
}

/// Errors from running or stepping a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("Enter some code to run")]
    EmptyProgram,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn load(source: &str) -> Cpu {
        let program = assemble(source).unwrap();
        let mut cpu = Cpu::new();
        cpu.load(program);
        cpu
    }

    fn reg(cpu: &Cpu, id: RegisterId) -> i32 {
        cpu.regs.peek(id)
    }

    #[test]
    fn test_lw_inc_sw_roundtrip() {
        let mut cpu = load("lw $r1, x\ninc $r1\nsw $r1, x\nvariables:\nx: 5");

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 3);
        assert_eq!(reg(&cpu, RegisterId::R1), 6);
        assert_eq!(cpu.vars.get("x"), Some(6));
        assert_eq!(cpu.vars.len(), 1);
        assert_eq!(cpu.trace().lines().count(), 3);
        assert_eq!(cpu.state, CpuState::Finished);
    }

    #[test]
    fn test_trace_format() {
        let mut cpu = load("li $r1, 5");
        cpu.run().unwrap();
        assert_eq!(cpu.trace(), "li($r1, 5) - 101101000100000000000001010000\n");
    }

    #[test]
    fn test_add_overflow_aborts() {
        let mut seeded = load("li $r2, 32000\nli $r3, 1000\nli $r1, 7\nadd $r1, $r2, $r3\ninc $r4");
        let err = seeded.run().unwrap_err();

        assert_eq!(err.to_string(), "Number exceeded maximum limit: 32767");
        assert_eq!(reg(&seeded, RegisterId::R1), 7);
        assert_eq!(reg(&seeded, RegisterId::R4), 0);
        assert_eq!(seeded.cycles, 3);
        assert!(seeded.trace().ends_with("Number exceeded maximum limit: 32767"));
        assert_eq!(seeded.state, CpuState::Faulted);
    }

    #[test]
    fn test_failing_first_instruction_leaves_only_error() {
        let mut cpu = load("divi $r1, $r2, 0");
        let err = cpu.run().unwrap_err();

        assert_eq!(err, CpuError::Runtime(RuntimeError::DivideByZero));
        assert_eq!(cpu.trace(), "Divide by zero exception");
    }

    #[test]
    fn test_add_overflow_with_preset_registers() {
        let mut cpu = load("add $r1, $r2, $r3");
        cpu.regs.write(RegisterId::R2, 32_000);
        cpu.regs.write(RegisterId::R3, 1_000);

        let instr = cpu.program().instructions[0].instruction().clone();
        let result = instr.execute(&mut cpu.regs, &VariableTable::new());

        assert_eq!(result, Err(RuntimeError::Limit(LimitError::AboveMaximum)));
        assert_eq!(reg(&cpu, RegisterId::R1), 0);
    }

    #[test]
    fn test_div_by_zero_leaves_destination() {
        let mut cpu = load("li $r1, 9\nli $r2, 10\ndiv $r1, $r2, $r3");
        let err = cpu.run().unwrap_err();

        assert_eq!(err.to_string(), "Divide by zero exception");
        assert_eq!(reg(&cpu, RegisterId::R1), 9);
    }

    #[test]
    fn test_division_floors() {
        let mut cpu = load("li $r1, -7\nli $r2, 2\ndiv $r3, $r1, $r2\ndivi $r4, $r1, 2");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R3), -4);
        assert_eq!(reg(&cpu, RegisterId::R4), -4);
    }

    #[test]
    fn test_overflow_wrap_variants() {
        let mut cpu = load(
            "li $r1, 32767\nli $r2, 1\naddo $r3, $r1, $r2\n\
             li $r4, -32768\nsubo $r5, $r4, $r2\nmulo $r6, $r1, $r1",
        );
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R3), -32_768);
        assert_eq!(reg(&cpu, RegisterId::R5), 32_767);
        assert_eq!(reg(&cpu, RegisterId::R6), 32_767);
    }

    #[test]
    fn test_lshift_clamps_to_zero() {
        let mut cpu = load("li $r1, 1\nlshift $r2, $r1, 4\nlshift $r3, $r1, 15\nli $r4, -64\nrshift $r5, $r4, 3");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R2), 16);
        assert_eq!(reg(&cpu, RegisterId::R3), 0);
        assert_eq!(reg(&cpu, RegisterId::R5), -8);
    }

    #[test]
    fn test_bitwise() {
        let mut cpu = load("li $r1, 12\nli $r2, 10\nand $r3, $r1, $r2\nor $r4, $r1, $r2\nxor $r5, $r1, $r2");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R3), 8);
        assert_eq!(reg(&cpu, RegisterId::R4), 14);
        assert_eq!(reg(&cpu, RegisterId::R5), 6);
    }

    #[test]
    fn test_two_reg_unary_ops() {
        let mut cpu = load("li $r1, -17\nabs $r2, $r1\nneg $r3, $r1\nli $r4, 50\nsqrt $r5, $r4\ncp $r6, $r1");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R2), 17);
        assert_eq!(reg(&cpu, RegisterId::R3), 17);
        assert_eq!(reg(&cpu, RegisterId::R5), 7);
        assert_eq!(reg(&cpu, RegisterId::R6), -17);
    }

    #[test]
    fn test_neg_and_abs_of_minimum_are_bounds_checked() {
        let mut cpu = load("li $r1, -32768\nneg $r2, $r1");
        assert_eq!(
            cpu.run().unwrap_err(),
            CpuError::Runtime(RuntimeError::Limit(LimitError::AboveMaximum))
        );

        let mut cpu = load("li $r1, -32768\nabs $r2, $r1");
        assert!(cpu.run().is_err());
    }

    #[test]
    fn test_sqrt_of_negative() {
        let mut cpu = load("li $r1, -4\nsqrt $r2, $r1");
        assert_eq!(
            cpu.run().unwrap_err(),
            CpuError::Runtime(RuntimeError::NegativeSquareRoot(-4))
        );
    }

    #[test]
    fn test_comparisons_set_bit_register() {
        let cases = [
            ("eq", 3, 3, 1), ("eq", 3, 4, 0),
            ("gt", 5, 4, 1), ("gt", 4, 4, 0),
            ("gte", 4, 4, 1), ("lt", -1, 0, 1),
            ("lte", 1, 0, 0), ("neq", 1, 0, 1),
        ];

        for (op, a, b, expected) in cases {
            let mut cpu = load(&format!("li $r1, {}\nli $r2, {}\n{} $r1, $r2", a, b, op));
            cpu.run().unwrap();
            assert_eq!(reg(&cpu, RegisterId::Rb), expected, "{} {} {}", op, a, b);
        }
    }

    #[test]
    fn test_diff_and_expo() {
        let mut cpu = load("li $r1, -10\nli $r2, 3\ndiff $r3, $r1, $r2\nexpo $r4, $r2, $r2\nexpoi $r5, $r1, 2");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R3), 7);
        assert_eq!(reg(&cpu, RegisterId::R4), 27);
        assert_eq!(reg(&cpu, RegisterId::R5), 100);
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut cpu = load(
            "li $r1, 1\nli $r2, 2\nli $r3, 3\npush $r1\npush $r2\npush $r3\npop $r4\npop $r5\npop $r6\npop $r7",
        );
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R4), 3);
        assert_eq!(reg(&cpu, RegisterId::R5), 2);
        assert_eq!(reg(&cpu, RegisterId::R6), 1);
        assert_eq!(reg(&cpu, RegisterId::R7), 0);
    }

    #[test]
    fn test_stack_arithmetic_pops_twice() {
        let mut cpu = load("li $r1, 20\nli $r2, 6\npush $r2\npush $r1\nsubfs $r3\npush $r2\npush $r1\ndivs $r4");
        cpu.run().unwrap();
        // first pop is the top of the stack
        assert_eq!(reg(&cpu, RegisterId::R3), 14);
        assert_eq!(reg(&cpu, RegisterId::R4), 3);
        assert_eq!(cpu.regs.stack_depth(), 0);
    }

    #[test]
    fn test_divs_by_zero() {
        let mut cpu = load("li $r1, 5\npush $r1\ndivs $r2");
        // second pop hits the empty stack and reads 0
        assert_eq!(cpu.run().unwrap_err(), CpuError::Runtime(RuntimeError::DivideByZero));
        assert_eq!(reg(&cpu, RegisterId::R2), 0);
    }

    #[test]
    fn test_stack_combine_pushes() {
        let mut cpu = load("li $r1, 7\nli $r2, 5\nadds $r1, $r2\nsubs $r1, $r2\nmulso $r1, $r2\naddfs $r3");
        cpu.run().unwrap();
        assert_eq!(cpu.regs.stack_depth(), 1);
        assert_eq!(reg(&cpu, RegisterId::Sp), 12);
        // addfs popped 35 then 2
        assert_eq!(reg(&cpu, RegisterId::R3), 37);
    }

    #[test]
    fn test_zero_empties_stack() {
        let mut cpu = load("li $r1, 4\npush $r1\npush $r1\nzero $sp\nzero $r1");
        cpu.run().unwrap();
        assert_eq!(cpu.regs.stack_depth(), 0);
        assert_eq!(reg(&cpu, RegisterId::R1), 0);
    }

    #[test]
    fn test_inc_dec_bounds() {
        let mut cpu = load("li $r1, 32767\ninc $r1");
        assert!(cpu.run().is_err());
        assert_eq!(reg(&cpu, RegisterId::R1), 32_767);

        let mut cpu = load("li $r1, -32768\ndec $r1");
        assert_eq!(
            cpu.run().unwrap_err().to_string(),
            "Number exceeded minimum limit: -32768"
        );
    }

    #[test]
    fn test_run_resets_state() {
        let mut cpu = load("inc $r1\nsw $r1, x\nvariables:\nx: 0");
        cpu.run().unwrap();
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R1), 1);
        assert_eq!(cpu.vars.get("x"), Some(1));
        assert_eq!(cpu.trace().lines().count(), 2);
    }

    #[test]
    fn test_empty_program() {
        let mut cpu = Cpu::new();
        assert_eq!(cpu.run(), Err(CpuError::EmptyProgram));
        assert_eq!(cpu.step(), Err(CpuError::EmptyProgram));
    }

    #[test]
    fn test_step_sequence() {
        let mut cpu = load("li $r1, 1\ninc $r1\ninc $r1");

        assert_eq!(cpu.step(), Ok(StepStatus::Continue { next: 1 }));
        assert!(cpu.is_stepping());
        assert!(!cpu.can_run());
        assert!(cpu.can_stop());
        assert_eq!(reg(&cpu, RegisterId::R1), 1);

        assert_eq!(cpu.step(), Ok(StepStatus::Continue { next: 2 }));
        assert_eq!(cpu.step(), Ok(StepStatus::Finished));
        assert_eq!(reg(&cpu, RegisterId::R1), 3);
        assert_eq!(cpu.trace().lines().count(), 3);
        assert_eq!(cpu.cursor(), 0);
        assert_eq!(cpu.state, CpuState::Finished);

        // The next step starts a fresh sequence
        assert_eq!(cpu.step(), Ok(StepStatus::Continue { next: 1 }));
        assert_eq!(reg(&cpu, RegisterId::R1), 1);
        assert_eq!(cpu.trace().lines().count(), 1);
    }

    #[test]
    fn test_step_error_ends_sequence() {
        let mut cpu = load("li $r1, 1\ndivi $r2, $r1, 0\ninc $r1");

        cpu.step().unwrap();
        let err = cpu.step().unwrap_err();

        assert_eq!(err, CpuError::Runtime(RuntimeError::DivideByZero));
        assert_eq!(cpu.cursor(), 0);
        assert_eq!(cpu.state, CpuState::Faulted);
        assert!(cpu.trace().starts_with("li($r1, 1) - "));
        assert!(cpu.trace().ends_with("\nDivide by zero exception"));
        assert!(!cpu.stop());
    }

    #[test]
    fn test_stop() {
        let mut cpu = load("li $r1, 1\ninc $r1\ninc $r1");

        assert!(!cpu.stop());
        cpu.step().unwrap();
        assert!(cpu.stop());

        assert_eq!(cpu.state, CpuState::Stopped);
        assert_eq!(cpu.cursor(), 0);
        assert!(cpu.trace().ends_with(TERMINATION_MARKER));
        assert_eq!(reg(&cpu, RegisterId::R1), 1);
        assert!(cpu.can_run());
    }

    #[test]
    fn test_sw_replaces_variable_for_later_loads() {
        let mut cpu = load("li $r1, 42\nsw $r1, y\nlw $r2, y\nlw $r3, x\nvariables:\nx: 1\ny: 2");
        cpu.run().unwrap();
        assert_eq!(reg(&cpu, RegisterId::R2), 42);
        assert_eq!(reg(&cpu, RegisterId::R3), 1);
        // the declared table is untouched
        assert_eq!(cpu.program().variables.get("y"), Some(2));
    }

    #[test]
    fn test_decoded_memory_operand_resolves_by_address() {
        let mut vars = VariableTable::new();
        vars.declare("x", 11);
        vars.declare("y", 22);

        let instr = Instruction::new(Mnemonic::Lw, Operands::Memory {
            reg: RegisterId::R1, name: None, address: 116,
        });
        let effect = instr.execute(&mut Registers::new(), &vars).unwrap();
        assert_eq!(effect, Effect::store(RegisterId::R1, 22));

        let missing = Instruction::new(Mnemonic::Lw, Operands::Memory {
            reg: RegisterId::R1, name: None, address: 148,
        });
        assert!(matches!(
            missing.execute(&mut Registers::new(), &vars),
            Err(RuntimeError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn test_snapshot() {
        let mut cpu = load("li $r1, 3\nvariables:\nx: 9");
        cpu.run().unwrap();

        let snap = cpu.snapshot();
        assert_eq!(snap.registers[0].name, "$r1");
        assert_eq!(snap.registers[0].value, 3);
        assert_eq!(snap.variables[0].address, "0x0064");
        assert_eq!(snap.variables[0].value, 9);
        assert_eq!(snap.state, CpuState::Finished);
    }
}
