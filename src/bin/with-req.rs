// src/bin/with-req.rs

use clap::Parser;
use with_env::cli::ReqArgs;
use with_env::{logging, run_req};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = ReqArgs::parse();
    if let Err(err) = logging::init_logging(args.common.log_level, args.common.verbose) {
        eprintln!("with-req: {err:#}");
    }

    let code = match run_req(args).await {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("with-req error: {:#}", anyhow::Error::from(err));
            code
        }
    };
    std::process::exit(code);
}
