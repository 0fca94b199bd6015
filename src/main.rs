use std::process::ExitCode;

fn main() -> ExitCode {
    haploidize::cli::run()
}
