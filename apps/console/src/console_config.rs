use std::env;

use ascend_application::DEFAULT_BATCH_CHUNK_SIZE;
use ascend_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub demo_email: String,
    pub demo_password: String,
    pub batch_chunk_size: usize,
    pub seed_demo_data: bool,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        let demo_email =
            env::var("ASCEND_DEMO_EMAIL").unwrap_or_else(|_| "asha@ascend.example".to_owned());
        let demo_password =
            env::var("ASCEND_DEMO_PASSWORD").unwrap_or_else(|_| "demo-password".to_owned());

        let batch_chunk_size = match env::var("ASCEND_BATCH_CHUNK_SIZE") {
            Ok(value) => value.parse::<usize>().map_err(|error| {
                AppError::Validation(format!("invalid ASCEND_BATCH_CHUNK_SIZE: {error}"))
            })?,
            Err(_) => DEFAULT_BATCH_CHUNK_SIZE,
        };
        if batch_chunk_size == 0 {
            return Err(AppError::Validation(
                "ASCEND_BATCH_CHUNK_SIZE must be positive".to_owned(),
            ));
        }

        let seed_demo_data = env::var("ASCEND_SEED_DEMO_DATA")
            .unwrap_or_else(|_| "true".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            demo_email,
            demo_password,
            batch_chunk_size,
            seed_demo_data,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
