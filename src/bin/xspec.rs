use std::process;

fn main() {
    process::exit(xspec_runner::cli::run().into());
}
