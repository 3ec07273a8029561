//! Interactive exam loop: stdin commands and a countdown ticker.

use std::io::{self, BufRead};
use std::time::Duration as StdDuration;

use chrono::Duration;
use services::{ExamController, ExamError};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::render;

const TICK_INTERVAL: StdDuration = StdDuration::from_millis(250);

/// Remaining-time marks at which a reminder is printed.
const WARN_AT_SECS: [i64; 3] = [300, 60, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Choose(usize),
    Next,
    Previous,
    GoTo(usize),
    Clear,
    Show,
    Submit,
    Quit,
    Help,
    Unknown,
}

impl Input {
    /// Parse one line. Positions typed by the user are 1-based.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_ascii_lowercase();
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Self::Show;
        };

        match first {
            "next" | "n" | "]" => Self::Next,
            "prev" | "p" | "[" => Self::Previous,
            "clear" => Self::Clear,
            "show" => Self::Show,
            "submit" => Self::Submit,
            "quit" | "exit" | "q" => Self::Quit,
            "help" | "?" => Self::Help,
            "go" => words
                .next()
                .and_then(|raw| raw.parse::<usize>().ok())
                .and_then(|n| n.checked_sub(1))
                .map_or(Self::Unknown, Self::GoTo),
            word => Self::parse_choice(word),
        }
    }

    fn parse_choice(word: &str) -> Self {
        if let Ok(number) = word.parse::<usize>() {
            return number.checked_sub(1).map_or(Self::Unknown, Self::Choose);
        }
        let mut chars = word.chars();
        match (chars.next(), chars.next()) {
            (Some(letter @ 'a'..='z'), None) => Self::Choose(letter as usize - 'a' as usize),
            _ => Self::Unknown,
        }
    }
}

/// Forward lines from `reader` over a channel, read on a plain thread.
///
/// A read still pending when the exam ends does not keep the process alive.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// How the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Finished,
    Abandoned,
}

/// Drive an already started exam until it is submitted, times out or the
/// user quits. The ticker is dropped as soon as the attempt ends.
///
/// # Errors
///
/// Returns an error if input cannot be read or the controller has no session.
pub async fn run_exam(
    controller: &mut ExamController,
    lines: &mut mpsc::Receiver<io::Result<String>>,
) -> Result<LoopExit, Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_remaining = controller.tick()?;

    show_current(controller, last_remaining)?;
    println!("Type `help` for commands.");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let remaining = controller.tick()?;
                if let Some(mark) = crossed_warning(last_remaining, remaining) {
                    println!("\n{mark} left.");
                }
                last_remaining = remaining;
            }
            line = lines.recv() => {
                match line.transpose()? {
                    // End of input: score what we have.
                    None => {
                        match controller.submit() {
                            Ok(_) | Err(ExamError::NotInProgress { .. }) => {}
                            Err(err) => return Err(err.into()),
                        }
                        if controller.results().is_none() {
                            return Ok(LoopExit::Abandoned);
                        }
                    }
                    Some(line) => {
                        if handle_input(controller, Input::parse(&line))? == Some(LoopExit::Abandoned) {
                            return Ok(LoopExit::Abandoned);
                        }
                    }
                }
            }
        }

        if let Some(results) = controller.results() {
            print!("{}", render::results_view(results));
            return Ok(LoopExit::Finished);
        }
    }
}

fn crossed_warning(before: Duration, after: Duration) -> Option<&'static str> {
    WARN_AT_SECS
        .iter()
        .find(|secs| {
            let mark = Duration::seconds(**secs);
            before > mark && after <= mark && after > Duration::zero()
        })
        .map(|secs| match secs {
            300 => "5 minutes",
            60 => "1 minute",
            _ => "10 seconds",
        })
}

fn show_current(controller: &ExamController, remaining: Duration) -> Result<(), ExamError> {
    let session = controller.session().ok_or(ExamError::NoSession)?;
    print!("{}", render::question_view(session, remaining));
    Ok(())
}

fn handle_input(
    controller: &mut ExamController,
    input: Input,
) -> Result<Option<LoopExit>, ExamError> {
    let position = controller
        .session()
        .map(|s| s.position())
        .ok_or(ExamError::NoSession)?;

    let outcome = match input {
        Input::Choose(option) => controller.select_answer(position, option).map(|()| {
            let _ = controller.go_to(position + 1);
        }),
        Input::Next => controller.go_to(position + 1).map(drop),
        Input::Previous => controller.go_to(position.saturating_sub(1)).map(drop),
        Input::GoTo(target) => controller.go_to(target).map(drop),
        Input::Clear => controller.clear_answer(position),
        Input::Show => Ok(()),
        Input::Submit => controller.submit().map(drop),
        Input::Quit => return Ok(Some(LoopExit::Abandoned)),
        Input::Help => {
            println!("{}", render::EXAM_HELP);
            return Ok(None);
        }
        Input::Unknown => {
            println!("Unrecognized command. Type `help` for commands.");
            return Ok(None);
        }
    };

    match outcome {
        Ok(()) => {}
        Err(err @ (ExamError::OptionOutOfRange { .. } | ExamError::PositionOutOfRange { .. })) => {
            println!("{err}");
        }
        // The attempt just ended; the caller prints results.
        Err(ExamError::NotInProgress { .. }) => return Ok(None),
        Err(err) => return Err(err),
    }

    if controller.results().is_none() {
        let remaining = controller.tick()?;
        show_current(controller, remaining)?;
    }
    Ok(None)
}
