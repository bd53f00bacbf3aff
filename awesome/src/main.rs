mod handlers;
mod server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	env_logger::init();

	server::start_http().await?;
	Ok(())
}
