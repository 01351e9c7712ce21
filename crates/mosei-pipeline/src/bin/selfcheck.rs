use std::path::{Path, PathBuf};
use std::process::Command;

use mosei_media::CommandAligner;
use mosei_pipeline::PipelineConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let data_root = std::env::var("MOSEI_DATA_ROOT").unwrap_or_else(|_| "./data".to_string());
    let config = PipelineConfig::from_env(PathBuf::from(&data_root))?;

    println!(
        "mosei-selfcheck: starting with data_root={} work_dir={}",
        data_root,
        config.paths.work_dir.display()
    );
    ensure_workdir(&config.paths.work_dir).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;

    let aligner = CommandAligner::new(config.aligner.clone())
        .check()
        .map_err(|e| anyhow::anyhow!("face aligner not available: {}", e))?;
    println!("mosei-selfcheck: aligner at {}", aligner.display());

    println!("mosei-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;

    let marker = path.join(".selfcheck");
    tokio::fs::write(&marker, b"ok").await?;
    tokio::fs::remove_file(&marker).await?;
    Ok(())
}

fn ensure_tool(program: &str) -> anyhow::Result<()> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", program, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            program,
            output.status
        ));
    }
    Ok(())
}
