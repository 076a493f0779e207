//! Drives a session in the terminal until it finishes.

use anyhow::Result;
use coderun_core::{InputDisposition, SessionController, SessionStatus};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

enum Wake {
    Event(Option<SessionStatus>),
    Line(io::Result<Option<String>>),
    Interrupt,
}

/// Tracks how much of the session output has already been written to stdout.
#[derive(Debug, Default)]
struct Printer {
    printed: usize,
}

impl Printer {
    fn flush_new(&mut self, controller: &SessionController) -> Result<()> {
        let output = controller.output();
        let fresh = output.since(self.printed);
        self.printed = output.fragment_count();
        if !fresh.is_empty() {
            let mut stdout = io::stdout();
            stdout.write_all(fresh.as_bytes())?;
            stdout.flush()?;
        }
        Ok(())
    }

    /// The terminal already shows what the user typed.
    fn skip_echo(&mut self, controller: &SessionController) {
        self.printed = controller.output().fragment_count();
    }
}

/// Run the started session to a terminal status, answering prompts from stdin.
///
/// Ctrl-C or end of stdin while a prompt is open stops the session.
pub async fn drive(controller: &mut SessionController) -> Result<SessionStatus> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = Printer::default();

    loop {
        printer.flush_new(controller)?;

        let status = controller.status();
        if !status.is_live() {
            break;
        }

        let awaiting = status == SessionStatus::AwaitingInput;
        if awaiting {
            show_prompt(controller)?;
        }

        let wake = tokio::select! {
            status = controller.process_next() => Wake::Event(status),
            line = lines.next_line(), if awaiting => Wake::Line(line),
            _ = tokio::signal::ctrl_c() => Wake::Interrupt,
        };

        match wake {
            Wake::Event(None) => break,
            Wake::Event(Some(_)) => {}
            Wake::Line(Ok(Some(line))) => {
                match controller.send_input(&line) {
                    InputDisposition::Sent => printer.skip_echo(controller),
                    InputDisposition::Ignored(violation) => {
                        log::warn!("Input not delivered: {}", violation)
                    }
                    // The error is in the output and gets printed next round.
                    InputDisposition::Failed(e) => log::error!("Input not delivered: {}", e),
                }
            }
            Wake::Line(Ok(None)) => {
                log::info!("Stdin closed while the program was waiting for input");
                controller.stop();
            }
            Wake::Line(Err(e)) => {
                controller.stop();
                return Err(e.into());
            }
            Wake::Interrupt => {
                println!();
                controller.stop();
            }
        }
    }

    printer.flush_new(controller)?;
    if !controller.output().ends_with_newline() {
        println!();
    }
    Ok(controller.status())
}

fn show_prompt(controller: &SessionController) -> Result<()> {
    let Some(prompt) = controller.prompt() else {
        return Ok(());
    };
    // Prompts sent with the legacy marker are already part of the output.
    if controller.output().snapshot().trim_end().ends_with(prompt.trim_end()) {
        return Ok(());
    }
    let mut stdout = io::stdout();
    write!(stdout, "{} ", prompt)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_tracks_fragments() {
        let config = coderun_core::CoderunConfig::default();
        let controller = SessionController::from_config(&config);
        let mut printer = Printer::default();

        printer.flush_new(&controller).unwrap();
        assert_eq!(printer.printed, 0);
        printer.skip_echo(&controller);
        assert_eq!(printer.printed, 0);
    }
}
