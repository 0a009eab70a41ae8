use std::env;
use std::process;

use anyhow::Result;
use dotenvy::dotenv;

use treasury_core::config::Config;
use treasury_scripts::common::{build_options, print_usage, stage_from_matches};
use treasury_scripts::stages;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "treasury-scripts".to_string());
    let opts = build_options();

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("Error parsing arguments: {}", f);
            print_usage(&program, &opts);
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        print_usage(&program, &opts);
        return Ok(());
    }

    let stage = match stage_from_matches(&matches) {
        Ok(stage) => stage,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(&program, &opts);
            process::exit(1);
        }
    };

    let config = Config::from_env()?;
    log::info!("Running {:?} against {}", stage, config.db_path.display());

    stages::run(stage, &config).await
}
