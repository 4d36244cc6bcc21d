use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = aura_api::Args::parse();

	aura_api::run(args).await
}
