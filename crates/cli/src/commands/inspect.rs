//! `solgraph inspect`: show what the parser extracts from one file.

use super::PolicyArg;
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use solgraph_core::{CallType, Contract, FunctionCall, PolicyKind, SolidityParser};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = PolicyArg::Simple)]
    pub policy: PolicyArg,
}

impl InspectArgs {
    pub fn execute(&self) -> Result<()> {
        let content = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read file: {}", self.input.display()))?;

        let policy: PolicyKind = self.policy.into();
        let parser = SolidityParser::with_policy(policy.build());
        let parsed = parser.parse_file(&self.input.to_string_lossy(), &content);

        println!("{}", format!("🔍 {}", self.input.display()).bright_cyan().bold());
        println!("{}", "=".repeat(60).bright_cyan());
        println!("Policy: {}", parser.policy().name());

        if parsed.contracts.is_empty() {
            println!("⚠️  No contracts found");
            return Ok(());
        }

        for contract in &parsed.contracts {
            print_contract(contract);
        }
        Ok(())
    }
}

fn print_contract(contract: &Contract) {
    println!(
        "\n{} {} {}",
        "📄".bright_green(),
        contract.name.as_str().bright_green().bold(),
        format!("({}, {})", contract.kind.as_str(), contract.category).dimmed()
    );
    print_list("inherits", &contract.inherits);
    print_list("implements", &contract.implements);
    print_list("uses", &contract.uses_libraries);

    for function in &contract.external_functions {
        println!(
            "  {} {} {} {}",
            "fn".bright_yellow(),
            function.signature.as_str().bold(),
            format!("{} {}", function.visibility, function.state_mutability).dimmed(),
            function.selector.as_str().dimmed()
        );
        print_calls(&function.calls);
    }
    for function in &contract.internal_functions {
        println!(
            "  {} {} {}",
            "fn".yellow(),
            function.name.as_str().bold(),
            format!("{} {}", function.visibility, function.state_mutability).dimmed()
        );
        print_calls(&function.calls);
    }

    if !contract.events.is_empty() {
        let names = contract.events.iter().map(|e| e.name.clone()).collect::<Vec<_>>();
        print_list("events", &names);
    }
    if !contract.errors.is_empty() {
        let names = contract.errors.iter().map(|e| e.name.clone()).collect::<Vec<_>>();
        print_list("errors", &names);
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {}: {}", label.dimmed(), items.join(", "));
    }
}

fn print_calls(calls: &[FunctionCall]) {
    for call in calls {
        let kind = match call.call_type {
            CallType::Internal => call.call_type.as_str().normal(),
            CallType::Library => call.call_type.as_str().bright_blue(),
            CallType::External => call.call_type.as_str().bright_magenta(),
            CallType::Super => call.call_type.as_str().cyan(),
            CallType::Delegatecall => call.call_type.as_str().bright_red(),
            CallType::Modifier => call.call_type.as_str().dimmed(),
        };
        let target_type = call
            .target_type
            .as_deref()
            .map(|t| format!(" on {}", t))
            .unwrap_or_default();
        let args = call
            .arg_count
            .map(|n| format!(" /{}", n))
            .unwrap_or_default();
        println!("      → {} {}{}{}", kind, call.target, args, target_type);
    }
}
