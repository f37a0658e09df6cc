use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / LOG_FORMAT 等环境变量生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "auth", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "auth",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // the signing secret has no default, so a missing config is fatal here
    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "auth", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    let worker_threads = cfg.server.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "auth", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "auth",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "auth service starting"
    );

    rt.block_on(async move {
        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!(service = "auth", event = "shutdown_signal", "received Ctrl+C, shutting down"),
                Err(e) => {
                    error!(service = "auth", event = "signal_unavailable", error = %e, "cannot listen for Ctrl+C");
                    std::future::pending::<()>().await
                }
            }
        };
        match server::run(cfg, shutdown).await {
            Ok(()) => {
                info!(service = "auth", event = "stop", %service_id, pid, "auth service stopped normally");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "auth", event = "run_failed", error = %e, "server::run returned error");
                std::process::ExitCode::FAILURE
            }
        }
    })
}
