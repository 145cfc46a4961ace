// src/bin/with-newdb.rs

use clap::Parser;
use with_env::cli::NewdbArgs;
use with_env::{logging, run_newdb};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = NewdbArgs::parse();
    if let Err(err) = logging::init_logging(args.common.log_level, args.common.verbose) {
        eprintln!("with-newdb: {err:#}");
    }

    let code = match run_newdb(args).await {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("with-newdb error: {:#}", anyhow::Error::from(err));
            code
        }
    };
    std::process::exit(code);
}
