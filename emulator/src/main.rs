mod script;
mod session;

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process;

use sequencer_core::events::EventFlags;
use session::{Outcome, Session, SessionError};

fn main() -> io::Result<()> {
    let script = env::args().nth(1);
    let reader: Box<dyn BufRead> = match &script {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => {
                eprintln!("{path}: {err}");
                eprintln!("Usage: sequencer-emulator [script]");
                process::exit(2);
            }
        },
        None => Box::new(io::stdin().lock()),
    };
    let interactive = script.is_none();

    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let flags = EventFlags::new();
    let (mut session, startup) = match Session::new(&flags) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("emulator failed to start: {err}");
            process::exit(1);
        }
    };

    if interactive {
        writeln!(
            writer,
            "Power Sequencer Emulator ready. Type `help` for commands or `exit` to quit."
        )?;
    }
    for line in startup {
        writeln!(writer, "{line}")?;
    }

    run(reader, &mut writer, &mut session, interactive)
}

fn run(
    mut reader: Box<dyn BufRead>,
    writer: &mut impl Write,
    session: &mut Session<'_>,
    interactive: bool,
) -> io::Result<()> {
    let mut line = String::new();

    loop {
        line.clear();
        if interactive {
            write!(writer, "> ")?;
            writer.flush()?;
        }

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            if interactive {
                writeln!(writer)?;
            }
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !interactive {
            writeln!(writer, "> {trimmed}")?;
        }

        match session.handle_command(trimmed) {
            Ok(Outcome::Continue(responses)) => {
                for response in responses {
                    writeln!(writer, "{response}")?;
                }
            }
            Ok(Outcome::Exit) => {
                writeln!(writer, "Session closed.")?;
                break;
            }
            Err(err @ SessionError::Parse(_)) => writeln!(writer, "error: {err}")?,
            Err(err) => {
                writeln!(writer, "fatal: {err}")?;
                return Err(io::Error::other(err));
            }
        }
    }

    Ok(())
}
