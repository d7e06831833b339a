/// luabox CLI
///
/// Runs Lua snippets from files, the command line, or a JSON-lines stream
/// on stdin, printing captured output and the inferred result.
use luabox_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
