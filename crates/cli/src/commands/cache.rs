//! `solgraph build-cache`: persist library graphs for warm resolution.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use solgraph_core::{build_library_graph, write_library_graph, CacheError, GraphConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct BuildCacheArgs {
    #[arg(short, long)]
    pub config: PathBuf,

    /// Defaults to the config's `cache_dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Only build these library ids
    #[arg(long)]
    pub only: Vec<String>,
}

impl BuildCacheArgs {
    pub fn execute(&self) -> Result<()> {
        let config = GraphConfig::load(&self.config)
            .with_context(|| format!("Failed to load config {}", self.config.display()))?;
        let base_dir = match self.config.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let output_dir = self.output_dir(&config, &base_dir)?;

        println!("{}", "📦 Building library graphs".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!("📁 Output: {}", output_dir.display());

        let start = Instant::now();
        let mut written = 0;
        let mut skipped = 0;

        for library in &config.libraries {
            if !self.only.is_empty() && !self.only.contains(&library.id) {
                continue;
            }

            let graph = match build_library_graph(library, &base_dir) {
                Ok(graph) => graph,
                Err(CacheError::MissingRoot(root)) => {
                    println!(
                        "⏭️  {} skipped: {} does not exist",
                        library.id.as_str().yellow(),
                        root.display()
                    );
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to build {}", library.id));
                }
            };

            let path = write_library_graph(&graph, &output_dir)
                .with_context(|| format!("Failed to write graph for {}", library.id))?;
            println!(
                "✅ {} {}: {} contracts → {}",
                library.id.as_str().bright_green(),
                library.version,
                graph.call_graph.contracts.len(),
                path.display()
            );
            written += 1;
        }

        println!(
            "\n{} {} written, {} skipped in {:.3}s",
            "Done:".bright_green().bold(),
            written,
            skipped,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn output_dir(&self, config: &GraphConfig, base_dir: &Path) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        match &config.cache_dir {
            Some(dir) => Ok(base_dir.join(dir)),
            None => anyhow::bail!("No --output-dir given and the config has no cache_dir"),
        }
    }
}
