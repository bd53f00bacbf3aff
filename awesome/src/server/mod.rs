use std::env;

use axum::{Router, routing::get};

use crate::handlers::pages;

const DEFAULT_ADDR: &str = "127.0.0.1:9000";

pub fn router() -> Router {
	Router::new()
		.route("/", get(pages::index))
		.route("/article", get(pages::article))
}

pub async fn start_http() -> Result<(), Box<dyn std::error::Error>> {
	let addr = env::var("AWESOME_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

	let listener = tokio::net::TcpListener::bind(&addr).await?;
	log::info!("server started at http://{}...", addr);
	axum::serve(listener, router()).await?;
	Ok(())
}
