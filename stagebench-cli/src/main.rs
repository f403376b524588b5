//! `stagebench` binary entry point.

fn main() {
    if let Err(e) = stagebench_cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
