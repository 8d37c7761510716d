use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = kith_api::Args::parse();
	kith_api::run(args).await
}
