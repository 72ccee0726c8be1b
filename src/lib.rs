pub mod api;
pub mod audio;
pub mod auth;
mod cli;
pub mod config;
pub mod explanation;
pub mod notify;
pub mod practice;
pub mod session_view;
pub mod stt;

pub use api::{ApiError, HttpSessionClient, Session, SessionDataClient};
pub use auth::AuthContext;
pub use session_view::SessionView;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_prep_lib=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn run() {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = runtime.block_on(cli::run(args)) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
