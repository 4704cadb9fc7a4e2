use std::process::ExitCode;

fn main() -> ExitCode {
    fashiondesk_cli::run()
}
