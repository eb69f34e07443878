//! Prompting and colored output for the interactive menu.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

// ANSI styles
pub const RESET: &str = "\x1b[0m";
pub const BRIGHT: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const WHITE: &str = "\x1b[37m";

/// Ctrl+C state shared between the signal handler and the prompts.
///
/// While armed (a menu action is running) Ctrl+C only records a request,
/// which the next prompt turns into `MenuError::Cancelled`.
#[derive(Debug)]
pub struct Interrupt {
    armed: AtomicBool,
    requested: AtomicBool,
}

pub static INTERRUPT: Interrupt = Interrupt::new();

impl Interrupt {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            requested: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.requested.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.requested.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending request.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// Ctrl+C, or end of input, while a prompt was waiting.
    #[error("input cancelled")]
    Cancelled,

    #[error("console error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Manager(#[from] psm_core::ManagerError),
}

pub type MenuResult<T> = Result<T, MenuError>;

pub struct Console<R, W> {
    input: R,
    out: W,
    interrupt: &'static Interrupt,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self::with_interrupt(input, out, &INTERRUPT)
    }

    pub fn with_interrupt(input: R, out: W, interrupt: &'static Interrupt) -> Self {
        Self {
            input,
            out,
            interrupt,
        }
    }

    pub fn interrupt(&self) -> &'static Interrupt {
        self.interrupt
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Prints one line in the given style.
    pub fn say(&mut self, style: &str, text: &str) -> MenuResult<()> {
        writeln!(self.out, "{}{}{}", style, text, RESET)?;
        Ok(())
    }

    pub fn raw(&mut self, text: &str) -> MenuResult<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    pub fn clear_screen(&mut self) -> MenuResult<()> {
        write!(self.out, "\x1b[2J\x1b[H")?;
        Ok(())
    }

    /// Shows a prompt and returns the trimmed line. Ctrl+C or end of input
    /// cancels.
    pub fn ask(&mut self, style: &str, prompt: &str) -> MenuResult<String> {
        if self.interrupt.take() {
            return Err(MenuError::Cancelled);
        }
        write!(self.out, "{}{}{}", style, prompt, RESET)?;
        self.out.flush()?;
        let mut line = String::new();
        let read = match self.input.read_line(&mut line) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => 0,
            r => r?,
        };
        if self.interrupt.take() || read == 0 {
            writeln!(self.out)?;
            return Err(MenuError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    /// Re-prompts until a number in `1..=max` is entered; returns it 0-based.
    pub fn pick_number(&mut self, prompt: &str, max: usize) -> MenuResult<usize> {
        loop {
            let s = self.ask(BRIGHT, prompt)?;
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                self.say(YELLOW, "Invalid input! Please enter a number.")?;
                continue;
            }
            match s.parse::<usize>() {
                Ok(n) if (1..=max).contains(&n) => return Ok(n - 1),
                _ => self.say(YELLOW, "Number out of range!")?,
            }
        }
    }

    /// `(Y/N)` question; anything but `y` is a no.
    pub fn confirm(&mut self, style: &str, prompt: &str) -> MenuResult<bool> {
        let s = self.ask(style, prompt)?;
        Ok(s.eq_ignore_ascii_case("y"))
    }

    pub fn pause(&mut self, prompt: &str) -> MenuResult<()> {
        self.ask(CYAN, prompt).map(|_| ())
    }
}
