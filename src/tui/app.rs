//! Debugger application state and logic.

use crate::{Machine, Instruction};
use crate::asm::disasm::{disassemble_instruction, format_instruction};
use crate::cpu::PROGRAM_SIZE;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Loaded program, reloaded on reset.
    pub program: Vec<Instruction>,
    /// Breakpoints (by clock value).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Pause between cycles while running.
    pub cycle_delay: Duration,
    last_tick: Option<Instant>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<Instruction>, cycle_delay: Duration) -> Self {
        let mut machine = Machine::new();
        let status = match machine.load(&program) {
            Ok(n) => format!("Loaded {} words. Press 's' to step, 'r' to run, 'q' to quit.", n),
            Err(e) => format!("Load failed: {}", e),
        };

        Self {
            machine,
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            cycle_delay,
            last_tick: None,
        }
    }

    /// Execute one cycle.
    pub fn step(&mut self) {
        let cycle = self.machine.step();
        self.status = match &cycle.fault {
            Some(e) => format!("CLK={:02}: {}  error: {}", cycle.address, cycle.instruction, e),
            None if cycle.jumped => format!("CLK={:02}: {}  (jumped)", cycle.address, cycle.instruction),
            None => format!("CLK={:02}: {}", cycle.address, cycle.instruction),
        };
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.last_tick = None;
        self.status = "Running...".into();
    }

    /// Stop continuous execution between cycles.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = format!("Paused after {} cycles.", self.machine.cycles());
    }

    /// Run one iteration of continuous execution, honoring the cycle delay.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        if let Some(last) = self.last_tick {
            if last.elapsed() < self.cycle_delay {
                return;
            }
        }

        // Check for breakpoint
        let clk = self.machine.clock().value().to_u8();
        if self.last_tick.is_some() && self.breakpoints.contains(&clk) {
            self.running = false;
            self.status = format!("Breakpoint at CLK={}", clk);
            return;
        }

        self.step();
        self.last_tick = Some(Instant::now());
    }

    /// Toggle breakpoint at the current clock value.
    pub fn toggle_breakpoint(&mut self) {
        let clk = self.machine.clock().value().to_u8();
        if self.breakpoints.remove(&clk) {
            self.status = format!("Removed breakpoint at CLK={}", clk);
        } else {
            self.breakpoints.insert(clk);
            self.status = format!("Set breakpoint at CLK={}", clk);
        }
    }

    /// Reset the machine and reload the program.
    pub fn reset(&mut self) {
        self.machine.reset();
        let _ = self.machine.load(&self.program);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Disassembly of the whole program store: (address, text, is_current).
    pub fn get_disassembly(&self) -> Vec<(u8, String, bool)> {
        let clk = self.machine.clock().address();
        self.machine
            .program()
            .words()
            .iter()
            .enumerate()
            .take(PROGRAM_SIZE)
            .map(|(addr, word)| (addr as u8, disassemble_instruction(*word), addr == clk))
            .collect()
    }

    /// Last executed instruction, for the input panel.
    pub fn last_instruction_text(&self) -> String {
        self.machine
            .last_instruction()
            .map(|i| format_instruction(&i))
            .unwrap_or_else(|| "-".into())
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<Instruction>, cycle_delay: Duration) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, cycle_delay);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Opcode;

    fn app() -> DebuggerApp {
        let program = vec![
            Instruction::with(Opcode::Immd, 1, 5).unwrap(),
            Instruction::with(Opcode::Immd, 2, 3).unwrap(),
            Instruction::with(Opcode::Add, 1, 2).unwrap(),
        ];
        DebuggerApp::new(program, Duration::ZERO)
    }

    #[test]
    fn test_step_updates_status() {
        let mut app = app();
        app.step();
        assert_eq!(app.status, "CLK=00: IMMD R1, 5");
        assert_eq!(app.last_instruction_text(), "IMMD R1, 5");
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app();
        app.toggle_breakpoint();
        app.run();
        for _ in 0..20 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.machine.cycles(), 16);
    }

    #[test]
    fn test_reset_reloads() {
        let mut app = app();
        app.step();
        app.reset();
        assert_eq!(app.machine.cycles(), 0);
        assert_eq!(app.get_disassembly()[0].1, "IMMD R1, 5");
        assert!(app.get_disassembly()[0].2);
    }
}
