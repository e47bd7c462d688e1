use clap::Parser;
use log::info;
use plottwist_llm::cleaner::{ clean_file, SentenceStripper };
use plottwist_llm::cli::CleanArgs;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CleanArgs::parse();

    info!("Metadata file: {}", args.file);
    info!("Strip phrase: '{}'", args.pattern);

    let stripper = SentenceStripper::new(&args.pattern)?;
    let report = clean_file(&args.file, &stripper, args.dry_run)?;
    println!("{}", report.removed_count);

    Ok(())
}
