use std::process::ExitCode;

fn main() -> ExitCode {
    tailorlink_cli::run()
}
