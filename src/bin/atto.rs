use atto_lisp::{cmdline, Evaluator};
use log::LevelFilter;

fn main() -> Result<(), cmdline::Error> {
    let options = cmdline::Options::parse(std::env::args().skip(1))?;
    let mut builder = pretty_env_logger::formatted_builder();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if options.trace {
        builder.filter_level(LevelFilter::Trace);
    } else if options.trace_parse {
        builder.filter_module("atto_lisp::interpreter", LevelFilter::Debug);
    }
    builder.init();
    let evaluator = Evaluator::new();
    cmdline::launch(&options, &evaluator)
}
