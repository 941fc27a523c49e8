use minilisp::cmdline;

fn main() -> Result<(), cmdline::Error> {
    pretty_env_logger::init();
    let options = cmdline::Options::from_args(std::env::args().skip(1))?;
    cmdline::launch(options)
}
