mod cli;
mod logging;

use clap::Parser;
use clipflow_config::Config;

/// Turn a crate error into a terminal report.
pub(crate) trait Diagnose<T> {
    fn diagnose(self) -> miette::Result<T>;
}

impl<T> Diagnose<T> for clipflow_api::error::Result<T> {
    fn diagnose(self) -> miette::Result<T> {
        self.map_err(|err| miette::miette!(help = err.user_message(), "{}", *err))
    }
}

impl<T> Diagnose<T> for clipflow_browser::error::Result<T> {
    fn diagnose(self) -> miette::Result<T> {
        self.map_err(|err| miette::miette!(help = err.user_message(), "{}", *err))
    }
}

impl<T> Diagnose<T> for clipflow_config::error::Result<T> {
    fn diagnose(self) -> miette::Result<T> {
        self.map_err(|err| miette::miette!("{}", *err))
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load(cli.config.as_deref()).diagnose()?;
    tracing::debug!(base_url = %config.api.base_url, per_page = config.browser.per_page, "Configuration loaded");
    cli::run(cli.command, config).await
}
