#[tokio::main]
async fn main() -> anyhow::Result<()> {
    venue_booking_backend::start_web_server().await
}
