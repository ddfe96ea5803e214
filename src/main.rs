use pawgate::{AppContext, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pawgate::init_tracing();

    let config = Config::builder().from_env().build()?;

    let ctx = AppContext::builder().from_config(&config)?.build();

    pawgate::serve(config, ctx).await?;

    Ok(())
}
