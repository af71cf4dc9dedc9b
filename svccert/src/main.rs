use std::process::ExitCode;

use clap::Parser;
use svccert::{issue_server_certificate, verify_bundle, Cli};

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).env().init() {
        eprintln!("logger init failed: {}", e);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let bundle = match issue_server_certificate(&cfg) {
        Ok(bundle) => bundle,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cfg.verify {
        if let Err(e) = verify_bundle(&bundle) {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    println!("{}", bundle.dir.display());
    ExitCode::SUCCESS
}
