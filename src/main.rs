use clap::Parser;
use corebid::cli::{self, output, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::execute(&cli) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
