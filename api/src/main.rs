#[tokio::main]
async fn main() {
    if let Err(e) = comment_api::run_server().await {
        // The subscriber may not be installed if startup failed early
        eprintln!("comment-api failed: {:#}", e);
        std::process::exit(1);
    }
}
