#[tokio::main]
async fn main() {
    if let Err(e) = resort_booking::run().await {
        eprintln!("resort-booking failed to start: {}", e);
        std::process::exit(1);
    }
}
