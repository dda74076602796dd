//! `solgraph graph`: parse a project and write its call graph.

use super::PolicyArg;
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use solgraph_core::parser::read_source_files;
use solgraph_core::{
    build_call_graph, resolve_external_dependencies, CallGraph, ChainResolver, Contract,
    GraphConfig, LibraryIndex, SolidityParser,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Solidity file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file; JSON goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// YAML or JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Pull in contracts from imported libraries
    #[arg(long)]
    pub resolve_deps: bool,

    #[arg(long)]
    pub project_name: Option<String>,

    #[arg(long)]
    pub pretty: bool,
}

impl GraphArgs {
    pub fn execute(&self) -> Result<()> {
        if !self.input.exists() {
            anyhow::bail!("Input path does not exist: {}", self.input.display());
        }

        let start = Instant::now();
        let config = self.load_config()?;
        let project_name = self.project_name(&config);

        let files = read_source_files(&self.input, "")
            .with_context(|| format!("Failed to read sources under {}", self.input.display()))?;
        if files.is_empty() {
            anyhow::bail!("No Solidity files found in {}", self.input.display());
        }
        debug!("Found {} Solidity files", files.len());

        let parser = SolidityParser::with_policy(config.call_policy.build());
        let mut contracts = parser.parse_files(&files, &config.filter);

        if self.resolve_deps {
            contracts = self.resolve(contracts, &config, &parser)?;
        }

        let graph = build_call_graph(&project_name, contracts);
        let json = if self.pretty {
            serde_json::to_string_pretty(&graph)?
        } else {
            serde_json::to_string(&graph)?
        };

        match &self.output {
            Some(path) => {
                fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                print_summary(&graph, files.len(), path, start);
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    fn load_config(&self) -> Result<GraphConfig> {
        let mut config = match &self.config {
            Some(path) => GraphConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => GraphConfig::from_env(),
        };
        if let Some(policy) = self.policy {
            config.call_policy = policy.into();
        }
        Ok(config)
    }

    /// `--project-name`, then the config file's name, then the input's name.
    fn project_name(&self, config: &GraphConfig) -> String {
        if let Some(name) = &self.project_name {
            return name.clone();
        }
        if self.config.is_some() {
            return config.project_name.clone();
        }
        self.input
            .canonicalize()
            .unwrap_or_else(|_| self.input.clone())
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| config.project_name.clone())
    }

    /// Library roots and the cache dir are relative to the config file, or
    /// to the input when there is none.
    fn base_dir(&self) -> PathBuf {
        let anchor = self.config.as_deref().unwrap_or(&self.input);
        let dir = if anchor.is_dir() {
            anchor
        } else {
            anchor.parent().unwrap_or(Path::new("."))
        };
        if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir.to_path_buf()
        }
    }

    fn resolve(
        &self,
        contracts: Vec<Contract>,
        config: &GraphConfig,
        parser: &SolidityParser,
    ) -> Result<Vec<Contract>> {
        let base_dir = self.base_dir();
        let mut resolver = ChainResolver::new();

        if let Some(cache_dir) = &config.cache_dir {
            let cache_dir = base_dir.join(cache_dir);
            if cache_dir.is_dir() {
                let index = LibraryIndex::new();
                index.load_dir(&cache_dir).with_context(|| {
                    format!("Failed to load library cache {}", cache_dir.display())
                })?;
                resolver = resolver.with(index);
            } else {
                warn!("Library cache {} does not exist", cache_dir.display());
            }
        }
        resolver = resolver.with(config.fs_resolver(&base_dir));

        let report = resolve_external_dependencies(contracts, &resolver, parser, config.max_depth)?;
        print_resolution(
            report.resolved.len(),
            &report.unresolved,
            report.external_count(),
        );
        Ok(report.contracts)
    }
}

fn print_resolution(resolved: usize, unresolved: &[String], added: usize) {
    eprintln!(
        "{} {} imports resolved, {} library contracts added",
        "🔗".bright_blue(),
        resolved,
        added
    );
    if !unresolved.is_empty() {
        eprintln!(
            "{} {} unresolved imports:",
            "⚠️ ".yellow(),
            unresolved.len()
        );
        for path in unresolved {
            eprintln!("   - {}", path);
        }
    }
}

fn print_summary(graph: &CallGraph, file_count: usize, output: &Path, start: Instant) {
    println!(
        "\n✅ {} Call graph for {}",
        "SUCCESS:".bright_green().bold(),
        graph.project_name.as_str().bold()
    );
    println!("   Files: {}", file_count);
    println!(
        "   Contracts: {} ({} libraries, {} interfaces)",
        graph.stats.total_contracts, graph.stats.total_libraries, graph.stats.total_interfaces
    );
    println!("   Functions: {}", graph.stats.total_functions);
    println!("   Dependencies: {}", graph.dependencies.len());
    if !graph.proxy_groups.is_empty() {
        println!("   Proxy groups: {}", graph.proxy_groups.len());
    }
    println!("   Time: {:.3}s", start.elapsed().as_secs_f64());
    println!("   Output: {}", output.display());
}
