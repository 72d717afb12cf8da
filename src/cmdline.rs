use crate::evaluator::Evaluator;
use crate::interpreter;
use ansi_term::Colour;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Error {
    UnknownOption(String),
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownOption(flag) => write!(f, "unknown option {}", flag),
            Error::IOError(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    /// Force log output to trace level, showing every evaluation step.
    pub trace: bool,
    /// Log each top-level form as it is read, before it is evaluated.
    pub trace_parse: bool,
    /// Enter the REPL even after running scripts.
    pub repl: bool,
    pub scripts: Vec<PathBuf>,
}

impl Options {
    /// Parses the arguments that follow the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, Error> {
        let mut options = Options::default();
        for arg in args {
            match arg.as_str() {
                "--trace" | "-t" => options.trace = true,
                "--traceparse" | "-tp" => options.trace_parse = true,
                "--repl" | "-r" => options.repl = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(Error::UnknownOption(arg))
                }
                _ => options.scripts.push(PathBuf::from(arg)),
            }
        }
        Ok(options)
    }

    fn wants_repl(&self) -> bool {
        self.repl || self.scripts.is_empty()
    }
}

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("atto")?;
    interface.set_prompt("lisp> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".atto_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

fn paint_error(message: &str) -> String {
    let message = format!("Error: {}", message);
    match atty::is(atty::Stream::Stdout) {
        true => Colour::Red.paint(message).to_string(),
        false => message,
    }
}

fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub fn repl<T: Terminal, E: fmt::Display>(
    interface: &Interface<T>,
    mut processor: impl FnMut(&str) -> Result<String, E>,
) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                if is_exit_command(&line) {
                    writeln!(interface, "Goodbye!").ok();
                    break;
                }
                match processor(&line) {
                    Ok(output) => writeln!(interface, "{}", output).ok(),
                    Err(e) => writeln!(interface, "{}", paint_error(&e.to_string())).ok(),
                };
            }
            Err(e) => {
                writeln!(interface, "{}", paint_error(&e.to_string())).ok();
                break;
            }
        }
    }
}

fn stdlib_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let path = exe.parent()?.join("stdlib.al");
    match path.is_file() {
        true => Some(path),
        false => None,
    }
}

// Script failures are reported and do not stop later scripts.
fn run_script(path: &Path, evaluator: &Evaluator) {
    if let Err(e) = interpreter::load_file(path, evaluator) {
        log::warn!("{} abandoned after error", path.display());
        eprintln!("{}: {}", path.display(), paint_error(&e.to_string()));
    }
}

pub fn launch(options: &Options, evaluator: &Evaluator) -> Result<(), Error> {
    if let Some(stdlib) = stdlib_path() {
        run_script(&stdlib, evaluator);
    }
    for script in &options.scripts {
        run_script(script, evaluator);
    }
    if options.wants_repl() {
        let interface = setup()?;
        repl(&interface, |line| interpreter::rep(line, evaluator));
        save_history(&interface)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, Error> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_means_interactive() {
        let options = parse(&[]).unwrap();
        assert_eq!(options, Options::default());
        assert!(options.wants_repl());
    }

    #[test]
    fn scripts_and_flags() {
        let options = parse(&["-t", "a.al", "--repl", "b.al"]).unwrap();
        assert!(options.trace);
        assert!(options.wants_repl());
        assert_eq!(
            options.scripts,
            vec![PathBuf::from("a.al"), PathBuf::from("b.al")]
        );
        assert!(!parse(&["a.al"]).unwrap().wants_repl());
    }

    #[test]
    fn trace_parse_is_separate_from_trace() {
        let options = parse(&["-tp", "a.al"]).unwrap();
        assert!(options.trace_parse);
        assert!(!options.trace);
        assert!(parse(&["--traceparse"]).unwrap().trace_parse);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        match parse(&["--verbose"]) {
            Err(Error::UnknownOption(flag)) => assert_eq!(flag, "--verbose"),
            other => panic!("expected an unknown option, got {:?}", other),
        }
    }

    #[test]
    fn exit_commands_ignore_case() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(!is_exit_command("(exit)"));
    }
}
