use anyhow::Result;
use clap::{Parser, Subcommand};
use presence_api::{ApiClient, AttendanceService, Operation};
use presence_core::render;
use presence_core::{CaptureController, CaptureOutcome, UploadController};
use presence_hw::Camera;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod camera_source;
mod config;

use camera_source::CameraSource;
use config::Config;

#[derive(Parser)]
#[command(name = "presence", about = "Face-recognition attendance client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one webcam frame and mark attendance
    Capture,
    /// Capture and mark on a recurring interval until Ctrl-C
    Watch,
    /// Recognize faces in an image file (no attendance side effect)
    Recognize {
        /// Image file to analyze
        file: PathBuf,
    },
    /// Recognize faces in an image file and mark them present
    Mark {
        /// Image file to submit
        file: PathBuf,
    },
    /// Show the attendance report
    Report,
    /// Clear all attendance marks
    Reset,
    /// List the students the backend can recognize
    Students,
    /// Download the absent-students CSV
    Export {
        /// Output path (defaults to the server-suggested filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show backend health
    Status,
    /// List available camera devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let client: Arc<dyn AttendanceService> =
        Arc::new(ApiClient::new(&config.api_url, config.http_timeout())?);

    match cli.command {
        Commands::Capture => {
            let ctl = capture_controller(&config, client);
            run_capture_once(&ctl).await;
        }
        Commands::Watch => {
            let ctl = capture_controller(&config, client);
            ctl.enable_auto();
            println!(
                "Capture automatique activée (intervalle: {} ms). Ctrl-C pour arrêter.",
                config.capture_interval_ms
            );
            tokio::signal::ctrl_c().await?;
            ctl.disable_auto();
            println!("Capture automatique désactivée");

            let session = ctl.session();
            let report = session.lock().unwrap().report().cloned();
            if let Some(report) = report {
                print!("{}", render::render_report(&report));
            }
        }
        Commands::Recognize { file } => {
            let upload = UploadController::new(client);
            upload.select_file(&file).await?;
            upload.recognize().await;

            if let Some(notice) = upload.notice() {
                println!("{}", notice.text);
            } else {
                let results = upload.results();
                if results.is_empty() {
                    println!("Aucun visage détecté");
                } else {
                    print!("{}", render::render_results(&results));
                }
            }
        }
        Commands::Mark { file } => {
            let upload = UploadController::new(client);
            upload.select_file(&file).await?;
            upload.mark().await;

            if let Some(notice) = upload.notice() {
                println!("{}", notice.text);
            }
        }
        Commands::Report => match client.report().await {
            Ok(report) => print!("{}", render::render_report(&report)),
            Err(e) => {
                tracing::warn!(error = %e, "report fetch failed");
                println!("{}", Operation::Report.user_message());
            }
        },
        Commands::Reset => match client.reset().await {
            Ok(ack) => {
                println!("{}", ack.message);
                if let Ok(report) = client.report().await {
                    print!("{}", render::render_report(&report));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "reset failed");
                println!("{}", Operation::Reset.user_message());
            }
        },
        Commands::Students => match client.known_students().await {
            Ok(students) => print!("{}", render::render_students(&students)),
            Err(e) => {
                tracing::warn!(error = %e, "student list fetch failed");
                println!("{}", Operation::ListStudents.user_message());
            }
        },
        Commands::Export { output } => match client.download_absent_csv().await {
            Ok(export) => {
                let path = output.unwrap_or_else(|| PathBuf::from(&export.filename));
                tokio::fs::write(&path, &export.bytes).await?;
                println!("Export CSV réussi: {}", path.display());
            }
            Err(e) => {
                tracing::warn!(error = %e, "CSV export failed");
                println!("{}", Operation::ExportCsv.user_message());
            }
        },
        Commands::Status => match client.health().await {
            Ok(health) => print!("{}", render::render_health(&health)),
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                println!("{}", Operation::Health.user_message());
            }
        },
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("Aucune caméra détectée");
            } else {
                for dev in devices {
                    println!("{}\t{} ({})", dev.path, dev.name, dev.driver);
                }
            }
        }
    }

    Ok(())
}

fn capture_controller(config: &Config, client: Arc<dyn AttendanceService>) -> CaptureController {
    let frames = Arc::new(CameraSource::new(config.camera_device.clone()));
    CaptureController::new(
        client,
        frames,
        presence_core::session::shared(),
        config.capture_settings(),
    )
}

async fn run_capture_once(ctl: &CaptureController) {
    match ctl.capture_once().await {
        CaptureOutcome::Marked { recognized, .. } => {
            if recognized.is_empty() {
                println!("Aucun visage reconnu");
            } else {
                println!("Reconnu: {}", recognized.join(", "));
            }

            let session = ctl.session();
            let report = session.lock().unwrap().report().cloned();
            if let Some(report) = report {
                print!("{}", render::render_report(&report));
            }
        }
        CaptureOutcome::SkippedNoFrame => println!("Caméra non disponible"),
        CaptureOutcome::SkippedBusy => {}
        CaptureOutcome::Failed(msg) => println!("{msg}"),
    }
}
