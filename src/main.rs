#[tokio::main]
async fn main() {
    if let Err(err) = fundmatch::cli::run().await {
        eprintln!("fundmatch error: {err}");
        std::process::exit(1);
    }
}
