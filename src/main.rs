use anyhow::Context;
use colored::Colorize;
use std::process;
use stylepipe::StylepipeError;

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<StylepipeError>() {
            Some(StylepipeError::Usage(usage)) => {
                let _ = usage.print();
            }
            _ => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {} {}", "caused by:".dimmed(), cause);
                }
            }
        }
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    stylepipe::cli::run().context("stylepipe failed")
}
