//! Debugger application state and logic.

use crate::asm::assemble;
use crate::cpu::{Cpu, CpuError, CpuState, Program, StepStatus};
use std::path::PathBuf;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub cpu: Cpu,
    /// Source file to reload from, if any.
    pub source_path: Option<PathBuf>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Console view scroll offset, in lines.
    pub trace_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Program, source_path: Option<PathBuf>) -> Self {
        let mut cpu = Cpu::new();
        cpu.load(program);

        Self {
            cpu,
            source_path,
            should_quit: false,
            status: "Ready. Press 'r' to run, 's' to step, 'q' to quit.".into(),
            trace_scroll: 0,
        }
    }

    /// Run the whole program.
    pub fn run(&mut self) {
        if !self.cpu.can_run() {
            self.status = "Stepping in progress. Press 'x' to stop first.".into();
            return;
        }

        self.status = match self.cpu.run() {
            Ok(count) => format!("Finished after {} instructions", count),
            Err(e) => format!("Error: {}", e),
        };
        self.scroll_to_end();
    }

    /// Execute the next instruction.
    pub fn step(&mut self) {
        let index = self.cpu.cursor();
        self.status = match self.cpu.step() {
            Ok(StepStatus::Continue { next }) => {
                format!("{:03}: {}  (next {:03})", index, self.instruction_text(index), next)
            }
            Ok(StepStatus::Finished) => {
                format!("{:03}: {}  (finished)", index, self.instruction_text(index))
            }
            Err(e @ CpuError::EmptyProgram) => format!("{}", e),
            Err(e) => format!("Error at {:03}: {}", index, e),
        };
        self.scroll_to_end();
    }

    /// Stop the current step sequence.
    pub fn stop(&mut self) {
        self.status = if self.cpu.stop() {
            "Stopped.".into()
        } else {
            "Nothing to stop.".into()
        };
        self.scroll_to_end();
    }

    /// Re-read and re-assemble the source file.
    ///
    /// On any error the current program stays loaded.
    pub fn reload(&mut self) {
        let Some(path) = self.source_path.clone() else {
            self.status = "No source file to reload.".into();
            return;
        };

        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                self.status = format!("Failed to read {}: {}", path.display(), e);
                return;
            }
        };

        match assemble(&source) {
            Ok(program) => {
                let count = program.len();
                self.cpu.load(program);
                self.cpu.reset();
                self.trace_scroll = 0;
                self.status = format!("Reloaded {} instructions", count);
            }
            Err(errors) => {
                let first = errors.iter().next().map(|e| e.to_string()).unwrap_or_default();
                self.status = format!("{} assembly errors. {}", errors.len(), first);
            }
        }
    }

    /// Program listing: index, text, and whether it executes next.
    pub fn program_lines(&self) -> Vec<(usize, String, bool)> {
        let next = match self.cpu.state {
            CpuState::Stepping => Some(self.cpu.cursor()),
            _ => None,
        };

        self.cpu
            .program()
            .instructions
            .iter()
            .enumerate()
            .map(|(i, instr)| (i, instr.text().to_string(), Some(i) == next))
            .collect()
    }

    pub fn scroll_up(&mut self) {
        self.trace_scroll = self.trace_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.trace_scroll + 1 < self.cpu.trace().lines().count() {
            self.trace_scroll += 1;
        }
    }

    fn scroll_to_end(&mut self) {
        self.trace_scroll = self.cpu.trace().lines().count().saturating_sub(1);
    }

    fn instruction_text(&self, index: usize) -> &str {
        self.cpu
            .program()
            .instructions
            .get(index)
            .map(|i| i.text())
            .unwrap_or("")
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Program, source_path: Option<PathBuf>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, source_path);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('s') => app.step(),
                        KeyCode::Char('x') => app.stop(),
                        KeyCode::Char('l') => app.reload(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
