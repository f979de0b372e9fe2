use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	rst_api::run(rst_api::Args::parse()).await
}
