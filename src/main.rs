mod cli;

use clap::Parser;
use gamepass_resolver::{
    common::{AnyResult, logger},
    configs::Config,
    protocol::by_bitrate_desc,
    sources::SourceManager,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> AnyResult<()> {
    let cli = cli::Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    logger::init(&config);

    let manager = SourceManager::new(&config);
    let streams = manager.streams(&cli.url)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    for (bitrate, stream) in by_bitrate_desc(&streams) {
        println!("{:>5}  {}", bitrate, stream.url);
    }
    Ok(())
}
