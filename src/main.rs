use clap::Parser;

use covidsim::runner::{run, BaseArgs};

fn main() {
    let args = BaseArgs::parse();
    if let Err(error) = run(&args) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
