//! asm-sim - CLI Entry Point
//!
//! Commands:
//! - `asm-sim run <source>` - Assemble and run a program
//! - `asm-sim check <source>` - Validate a program without running it
//! - `asm-sim debug <source>` - Interactive debugger
//! - `asm-sim asm <source>` - Assemble to a listing file
//! - `asm-sim disasm <listing>` - Disassemble a listing file
//! - `asm-sim isa` - Print the instruction catalog

use asmsim::cpu::{Mnemonic, Program, Shape, StepStatus};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "asm-sim")]
#[command(version = "0.1.0")]
#[command(about = "A teaching simulator for a small register-machine assembly language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program to completion
    Run {
        /// Path to the source file
        source: String,
        /// Print the execution trace
        #[arg(short, long)]
        trace: bool,
        /// Execute one instruction at a time, printing registers after each
        #[arg(short, long)]
        step: bool,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a program and print its encoding
    Check {
        /// Path to the source file
        source: String,
    },
    /// Interactive debugger
    Debug {
        /// Path to the source file
        source: String,
    },
    /// Assemble source to a listing file
    Asm {
        /// Path to the source file
        source: String,
        /// Output listing file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a listing file
    Disasm {
        /// Path to the listing file
        listing: String,
    },
    /// Print the instruction catalog
    Isa,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { source, trace, step, json }) => {
            run_program(&source, trace, step, json);
        }
        Some(Commands::Check { source }) => {
            check_program(&source);
        }
        Some(Commands::Debug { source }) => {
            debug_program(&source);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { listing }) => {
            disassemble_file(&listing);
        }
        Some(Commands::Isa) => {
            print_isa();
        }
        None => {
            println!("asm-sim v0.1.0");
            println!("A register-machine assembly simulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Read and assemble a source file, exiting on any error.
fn load_program(path: &str) -> Program {
    use asmsim::assemble;

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    match assemble(&source) {
        Ok(program) => program,
        Err(errors) => {
            eprintln!("❌ Assembly failed with {} errors:", errors.len());
            eprintln!("{}", errors);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, trace: bool, step: bool, json: bool) {
    use asmsim::Cpu;

    let program = load_program(path);
    if !json {
        println!("🔧 Running: {} ({} instructions)", path, program.len());
    }

    let mut cpu = Cpu::new();
    cpu.load(program);

    let result = if step {
        step_through(&mut cpu, json)
    } else {
        cpu.run().map(|_| ())
    };

    if json {
        match serde_json::to_string_pretty(&cpu.snapshot()) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if trace && !step {
            println!();
            println!("━━━ Trace ━━━");
            print!("{}", cpu.trace());
            println!();
        }

        println!();
        println!("━━━ Result ━━━");
        println!("Instructions: {}", cpu.cycles);
        println!("State: {:?}", cpu.state);
        print_registers(&cpu);
        print_variables(&cpu);
    }

    if let Err(e) = result {
        eprintln!("❌ Runtime error: {}", e);
        std::process::exit(1);
    }
}

fn step_through(cpu: &mut asmsim::Cpu, quiet: bool) -> Result<(), asmsim::CpuError> {
    loop {
        let index = cpu.cursor();
        let status = cpu.step()?;

        if !quiet {
            if let Some(line) = cpu.trace().lines().last() {
                println!("{:03}: {}", index, line);
            }
            let regs: Vec<String> = cpu
                .regs
                .snapshot()
                .iter()
                .filter(|r| r.value != 0)
                .map(|r| format!("{}={}", r.name, r.value))
                .collect();
            println!("     {}", regs.join(" "));
        }

        if status == StepStatus::Finished {
            return Ok(());
        }
    }
}

fn print_registers(cpu: &asmsim::Cpu) {
    println!();
    println!("Registers:");
    for reg in cpu.regs.snapshot() {
        println!("  {:<4} {:>6}", reg.name, reg.value);
    }
}

fn print_variables(cpu: &asmsim::Cpu) {
    if cpu.vars.is_empty() {
        return;
    }
    println!();
    println!("Memory:");
    for cell in cpu.vars.snapshot() {
        println!("  {}  {:<12} {:>6}", cell.address, cell.name, cell.value);
    }
}

fn check_program(path: &str) {
    let program = load_program(path);

    println!("✓ {} instructions, {} variables", program.len(), program.variables.len());
    for (i, instr) in program.instructions.iter().enumerate() {
        println!("{:03}: {:<24} {}", i, instr.text(), instr.encoding());
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use asmsim::tui::run_debugger;

    let program = load_program(path);
    println!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(program, Some(path.into())) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    eprintln!("❌ Built without the 'tui' feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use asmsim::save_listing;

    let out_path = output.unwrap_or_else(|| {
        match source_path.strip_suffix(".asm") {
            Some(stem) => format!("{}.lst", stem),
            None => format!("{}.lst", source_path),
        }
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let program = load_program(source_path);
    println!("✓ Assembled {} instructions", program.len());

    if let Err(e) = save_listing(&out_path, &program.words(), Some(&program.variables)) {
        eprintln!("❌ Failed to save listing: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(listing_path: &str) {
    use asmsim::{disassemble, load_listing};

    println!("📖 Disassembling: {}", listing_path);
    println!();

    let words = match load_listing(listing_path) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("❌ Failed to load listing: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble(&words));
}

fn print_isa() {
    for shape in Shape::SEARCH_ORDER {
        let signature: Vec<String> = shape.signature().iter().map(|k| k.to_string()).collect();
        println!("━━━ {:?} ({}) ━━━", shape, signature.join(", "));

        for &m in shape.mnemonics() {
            println!("  {:06b}  {:<7} {}", m.opcode(), m.name(), m.summary());
        }
        println!();
    }
    println!("{} instructions", Mnemonic::ALL.len());
}
