pub mod answer;
pub mod bitset;
pub mod bracelet;
pub mod canonical;
pub mod config;
pub mod crimp;
pub mod direct;
mod error;
pub mod flap_string;
pub mod fold;
pub mod inverter;
pub mod kawasaki;
pub mod mv;
pub mod naive;
pub mod pipeline;
pub mod ppc;
pub mod ring;
pub mod search;
pub mod serialization;
pub mod skeleton;
pub mod stats;
pub mod symmetry;
pub mod theorem;

pub use error::{Error, Result};

use std::io::Write;

/// Replaces the current terminal line with `str`.
pub fn print_overwrite(str: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\r{:width$}\r{str}", "", width = str.len() + 1)?;
    stdout.flush()
}

/// Status line that is rewritten in place, padded over whatever was longer
/// before.
#[derive(Default)]
pub struct Overwriter {
    last_len: usize,
}

impl Overwriter {
    pub fn print(&mut self, str: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\r{:width$}\r{str}", "", width = self.last_len)?;
        stdout.flush()?;
        self.last_len = str.len();
        Ok(())
    }

    /// Moves past the status line so regular output starts on a fresh one.
    pub fn finish(&mut self) {
        if self.last_len > 0 {
            println!();
            self.last_len = 0;
        }
    }
}
