use pqr::{Config, Environment, Error, external};
use std::ffi::OsString;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: pqr <command> [<args>...]";

fn main() {
    let mut args = std::env::args_os().skip(1);
    let Some(script) = args.next() else {
        println!("{USAGE}");
        process::exit(1);
    };
    let extra_args: Vec<OsString> = args.collect();

    let config = Config::from_env();
    init_logging(&config);

    match run(script, &extra_args, &config) {
        Ok(code) => process::exit(code),
        Err(err) => {
            if err.is_expected() {
                eprintln!("{err}");
            } else {
                eprintln!("Error: {:?}", anyhow::Error::from(err));
            }
            process::exit(1);
        }
    }
}

fn run(script: OsString, extra_args: &[OsString], config: &Config) -> pqr::Result<i32> {
    let start = std::env::current_dir().map_err(Error::CurrentDir)?;
    let inherited = Environment::inherit();
    let executor = external::executor_for(config);

    // A name that is not valid UTF-8 cannot be a key of the JSON scripts table.
    let script = script
        .into_string()
        .unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
    pqr::run(&start, &script, extra_args, &inherited, executor.as_ref())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
