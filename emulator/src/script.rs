//! Grammar for the emulator's stimulus console.
//!
//! ```text
//! press <duration>     hold the power button, then release it
//! wait <duration>      let time pass
//! request              companion power-request edge
//! shutdown             companion shutdown-complete edge
//! status               show lines, rails, and LEDs
//! help [topic]
//! exit | quit
//! ```
//!
//! Durations are whole numbers suffixed with `ms` or `s`.

use std::fmt;

use winnow::ascii::{Caseless, digit1, space0, space1};
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::prelude::*;
use winnow::token::take_while;

/// One parsed console line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    Press { ms: u32 },
    Wait { ms: u32 },
    Request,
    Shutdown,
    Status,
    Help(Option<&'a str>),
    Exit,
}

/// Console line that does not match the grammar.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseCommandError {
    pub offset: usize,
    pub input: String,
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized input at column {}: `{}`", self.offset + 1, self.input)
    }
}

impl std::error::Error for ParseCommandError {}

pub fn parse_command(line: &str) -> Result<Command<'_>, ParseCommandError> {
    delimited(space0, command, space0)
        .parse(line)
        .map_err(|err| ParseCommandError {
            offset: err.offset(),
            input: line.to_string(),
        })
}

fn command<'s>(input: &mut &'s str) -> ModalResult<Command<'s>> {
    alt((
        preceded((Caseless("press"), space1), duration_ms).map(|ms| Command::Press { ms }),
        preceded((Caseless("wait"), space1), duration_ms).map(|ms| Command::Wait { ms }),
        Caseless("request").value(Command::Request),
        Caseless("shutdown").value(Command::Shutdown),
        Caseless("status").value(Command::Status),
        preceded(Caseless("help"), opt(preceded(space1, topic))).map(Command::Help),
        alt((Caseless("exit"), Caseless("quit"))).value(Command::Exit),
    ))
    .parse_next(input)
}

fn duration_ms(input: &mut &str) -> ModalResult<u32> {
    (
        digit1.parse_to::<u32>(),
        alt((Caseless("ms").value(1u32), Caseless("s").value(1_000u32))),
    )
        .verify_map(|(value, scale)| value.checked_mul(scale))
        .parse_next(input)
}

fn topic<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}
