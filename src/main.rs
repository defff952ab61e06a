#[tokio::main]
async fn main() {
    if let Err(e) = reportcore::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
