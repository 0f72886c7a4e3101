//! Phase progress output.

use crate::reset::Phase;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Receives progress from the resolver and the reset protocol
pub trait Reporter {
    fn phase_started(&mut self, phase: Phase, message: &str);
    fn phase_succeeded(&mut self, phase: Phase, message: &str);
    /// The phase completed but something needs the user's attention
    fn phase_warned(&mut self, phase: Phase, message: &str);
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    /// Only shown in verbose mode
    fn detail(&mut self, message: &str);
}

/// Spinner per phase on stderr, results on stdout
pub struct TerminalReporter {
    verbose: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        TerminalReporter {
            verbose,
            spinner: None,
        }
    }

    fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print without tearing an active spinner
    fn print_err(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    fn print_out(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }
}

fn phase_tag(phase: Phase) -> String {
    format!("[{}]", phase.label())
}

impl Reporter for TerminalReporter {
    fn phase_started(&mut self, phase: Phase, message: &str) {
        self.finish_spinner();

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("{} {}", phase_tag(phase), message));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn phase_succeeded(&mut self, phase: Phase, message: &str) {
        self.finish_spinner();
        println!(
            "{} {} {}",
            "✔".green(),
            phase_tag(phase).bold(),
            message
        );
    }

    fn phase_warned(&mut self, phase: Phase, message: &str) {
        self.finish_spinner();
        println!(
            "{} {} {}",
            "!".yellow().bold(),
            phase_tag(phase).bold(),
            message.yellow()
        );
    }

    fn info(&mut self, message: &str) {
        self.print_out(format!("{} {}", "i".blue(), message));
    }

    fn warn(&mut self, message: &str) {
        self.print_err(format!("{} {}", "warning:".yellow().bold(), message));
    }

    fn detail(&mut self, message: &str) {
        if self.verbose {
            self.print_out(format!("  {}", message.dimmed()));
        }
    }
}

impl Drop for TerminalReporter {
    fn drop(&mut self) {
        self.finish_spinner();
    }
}
