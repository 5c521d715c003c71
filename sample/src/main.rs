use fibre_bridge::{Configuration, Environment, Mode};
use fibre_bridge_sample::build_application;
use fibre_bridge_sample::controllers::HomeController;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  match run() {
    Ok(page) => {
      println!("{page}");
      ExitCode::SUCCESS
    }
    Err(e) => {
      error!(error = %e, "sample application failed");
      ExitCode::FAILURE
    }
  }
}

fn run() -> Result<String, Box<dyn std::error::Error>> {
  let root = std::env::current_dir()?;
  let environment = Environment::new(root, Mode::Dev);
  let config_path = std::env::args()
    .nth(1)
    .map(PathBuf::from)
    .unwrap_or_else(|| environment.file("conf/application.yaml"));
  let configuration = Configuration::from_file(&config_path)?;

  let app = build_application(environment, configuration)?;
  let controller = app.injector().instance_of::<HomeController>()?;
  controller.index()?;
  let page = controller.index()?;
  app.stop();
  Ok(page)
}
