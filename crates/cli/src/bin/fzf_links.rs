use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    fzf_links::main_entry().await
}
