use anyhow::Context;
use locallib_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    locallib_telemetry::init(&settings.telemetry)?;

    locallib_app::run(settings).await
}
