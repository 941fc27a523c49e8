use crate::evaluator::{ArityPolicy, EvalOptions, NullTest};
use crate::interpreter::{self, Session};
use crate::stdlib::Library;
use crate::types::Value;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROMPT: &str = ">";
pub const PRELUDE_VAR: &str = "MINILISP_PRELUDE";

const USAGE: &str =
    "usage: minilisp [--strict-arity] [--null-evaluates] [--prelude PATH] [--no-history] [FILE]\n\
     --no-history neither loads nor saves line history";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Interpreter(#[from] interpreter::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Options {
    pub eval: EvalOptions,
    pub prelude: Option<PathBuf>,
    pub no_history: bool,
    pub script: Option<PathBuf>,
}

fn usage(problem: &str) -> Error {
    Error::Usage(format!("{}\n{}", problem, USAGE))
}

impl Options {
    /// Parses arguments, program name excluded. Falls back to `MINILISP_PRELUDE` for the prelude.
    pub fn from_args<I>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::parse(args)?;
        if options.prelude.is_none() {
            options.prelude = std::env::var_os(PRELUDE_VAR).map(PathBuf::from);
        }
        Ok(options)
    }

    fn parse<I>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--strict-arity" => options.eval.arity = ArityPolicy::Strict,
                "--null-evaluates" => options.eval.null_test = NullTest::Value,
                "--no-history" => options.no_history = true,
                "--prelude" => match args.next() {
                    Some(path) => options.prelude = Some(PathBuf::from(path)),
                    None => return Err(usage("--prelude needs a path")),
                },
                flag if flag.starts_with("--") => {
                    return Err(usage(&format!("unknown option {}", flag)))
                }
                _ if options.script.is_some() => {
                    return Err(usage(&format!("unexpected argument {}", arg)))
                }
                _ => options.script = Some(PathBuf::from(&arg)),
            }
        }
        Ok(options)
    }
}

/// Builds the line editor. History is only read back when `with_history` is set.
pub fn setup(with_history: bool) -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("minilisp")?;
    interface.set_prompt(PROMPT)?;
    if let Some(path) = history_to_load(with_history) {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_to_load(with_history: bool) -> Option<PathBuf> {
    history_path().filter(|_| with_history)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".minilisp_history");
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

/// What the loop should do after a line has been evaluated.
#[derive(Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Renders the values of one input as output lines. `Void` shows nothing; `Exit` ends the session.
pub fn render(values: &[Value]) -> (Vec<String>, Control) {
    let mut lines = Vec::new();
    for value in values {
        match value {
            Value::Exit => return (lines, Control::Exit),
            Value::Void => {}
            other => lines.push(other.to_string()),
        }
    }
    (lines, Control::Continue)
}

pub fn repl<T: Terminal>(interface: &Interface<T>, session: &Session) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                interface.add_history_unique(line.clone());
                let outcome = session.run(&line);
                let (lines, control) = render(&outcome.values);
                for output in lines {
                    writeln!(interface, "{}", output).ok();
                }
                if let Some(e) = outcome.error {
                    log::debug!("error in {:?}: {:?}", line, e);
                    writeln!(interface, "{}", e).ok();
                }
                if control == Control::Exit {
                    break;
                }
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

fn load_prelude(session: &Session, options: &Options) -> Result<(), Error> {
    if let Some(path) = &options.prelude {
        log::info!("loading prelude from {}", path.display());
        let text = read_to_string(path)?;
        session.eval_text(&text)?;
    }
    Ok(())
}

fn run_script(session: &Session, path: &Path) -> Result<(), Error> {
    log::info!("running {}", path.display());
    let text = read_to_string(path)?;
    let values = session.eval_text(&text)?;
    for line in render(&values).0 {
        println!("{}", line);
    }
    Ok(())
}

pub fn launch(options: Options) -> Result<(), Error> {
    log::debug!("launching with {:?}", options);
    let session = Session::new(Library::standard(), options.eval);
    load_prelude(&session, &options)?;

    if let Some(path) = &options.script {
        return run_script(&session, path);
    }

    let interface = setup(!options.no_history)?;
    repl(&interface, &session);
    if !options.no_history {
        save_history(&interface)?;
    }
    Ok(())
}
