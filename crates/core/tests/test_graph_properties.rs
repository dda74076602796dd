use anyhow::{Context, Result};
use solgraph_core::{
    build_call_graph, parse_solidity_file, parse_solidity_files, CallGraph, CallType,
    DirectoryNode, FilterOptions, SourceFile,
};
use solgraph_core::model::NodeType;
use std::collections::BTreeSet;

fn corpus() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "repo/contracts/interfaces/IPool.sol",
            "interface IPool { function swap(uint256 amount) external returns (uint256); }",
        ),
        SourceFile::new(
            "repo/contracts/libraries/PoolMath.sol",
            r#"
library PoolMath {
    function scale(uint256 x) internal pure returns (uint256) { return PoolMath.half(x) * 3; }
    function half(uint256 x) internal pure returns (uint256) { return x / 2; }
}
"#,
        ),
        SourceFile::new(
            "repo/contracts/base/PoolBase.sol",
            r#"
abstract contract PoolBase {
    uint256 internal reserve;
    function _sync(uint256 amount) internal { reserve = amount; }
    function reserves() public view returns (uint256) { return reserve; }
}
"#,
        ),
        SourceFile::new(
            "repo/contracts/Pool.sol",
            r#"
import "./interfaces/IPool.sol";
import "./libraries/PoolMath.sol";
import "./base/PoolBase.sol";

contract Pool is IPool, PoolBase {
    IPool internal peer;

    function swap(uint256 amount) external returns (uint256) {
        uint256 scaled = PoolMath.scale(amount);
        _sync(scaled);
        peer.swap(scaled);
        return scaled;
    }

    function _fee(uint256 amount) private pure returns (uint256) { return amount / 100; }
}
"#,
        ),
    ]
}

fn graph_of(files: &[SourceFile]) -> CallGraph {
    build_call_graph("pool", parse_solidity_files(files, &FilterOptions::default()))
}

fn edge_set(graph: &CallGraph) -> BTreeSet<(String, String, String)> {
    graph
        .dependencies
        .iter()
        .map(|d| {
            (
                d.from.clone(),
                d.to.clone(),
                format!("{:?}", d.dependency_type),
            )
        })
        .collect()
}

fn file_paths(node: &DirectoryNode, out: &mut BTreeSet<(String, Option<String>)>) {
    if node.node_type == NodeType::File {
        out.insert((node.path.clone(), node.contract_name.clone()));
    }
    for child in &node.children {
        file_paths(child, out);
    }
}

#[test]
fn test_parsing_is_idempotent() {
    for file in corpus() {
        let first = parse_solidity_file(&file.path, &file.content);
        let second = parse_solidity_file(&file.path, &file.content);
        assert_eq!(first.contracts, second.contracts);
    }
}

#[test]
fn test_reordered_input_parses_the_same_contracts() {
    let files = corpus();
    let mut reversed = files.clone();
    reversed.reverse();

    let sorted = |files: &[SourceFile]| {
        let mut contracts = parse_solidity_files(files, &FilterOptions::default());
        contracts.sort_by(|a, b| (&a.file_path, &a.name).cmp(&(&b.file_path, &b.name)));
        contracts
    };
    assert_eq!(sorted(&files), sorted(&reversed));
}

#[test]
fn test_reordered_input_gives_same_graph() {
    let files = corpus();
    let mut reversed = files.clone();
    reversed.reverse();

    let forward = graph_of(&files);
    let backward = graph_of(&reversed);

    assert_eq!(edge_set(&forward), edge_set(&backward));
    assert_eq!(forward.stats, backward.stats);

    let names = |g: &CallGraph| {
        g.contracts
            .iter()
            .map(|c| (c.name.clone(), c.function_count()))
            .collect::<BTreeSet<_>>()
    };
    assert_eq!(names(&forward), names(&backward));
}

#[test]
fn test_no_self_edges_and_unique_edges() {
    let graph = graph_of(&corpus());
    assert!(graph.dependencies.iter().all(|d| d.from != d.to));
    assert_eq!(edge_set(&graph).len(), graph.dependencies.len());
}

#[test]
fn test_direct_library_call_links_library() -> Result<()> {
    let graph = graph_of(&corpus());
    let uses = graph
        .dependencies_from("Pool")
        .find(|d| d.to == "PoolMath")
        .context("Pool -> PoolMath edge missing")?;
    assert_eq!(uses.functions.as_deref(), Some(&["scale".to_string()][..]));
    Ok(())
}

#[test]
fn test_functions_partition_by_visibility() {
    let graph = graph_of(&corpus());
    for contract in &graph.contracts {
        for function in &contract.external_functions {
            assert!(
                function.visibility == "external" || function.visibility == "public",
                "{}.{} is {}",
                contract.name,
                function.name,
                function.visibility
            );
        }
        for function in &contract.internal_functions {
            assert!(
                function.visibility == "internal" || function.visibility == "private",
                "{}.{} is {}",
                contract.name,
                function.name,
                function.visibility
            );
        }
    }
}

#[test]
fn test_stats_match_contracts() {
    let graph = graph_of(&corpus());
    assert_eq!(graph.stats.total_contracts, 2);
    assert_eq!(graph.stats.total_libraries, 1);
    assert_eq!(graph.stats.total_interfaces, 1);
    assert_eq!(
        graph.stats.total_functions,
        graph
            .contracts
            .iter()
            .map(|c| c.function_count())
            .sum::<usize>()
    );
}

#[test]
fn test_directory_tree_covers_every_file() {
    let files = corpus();
    let graph = graph_of(&files);
    assert_eq!(graph.structure.name, "contracts");
    assert_eq!(graph.structure.path, "repo/contracts");

    let mut leaves = BTreeSet::new();
    file_paths(&graph.structure, &mut leaves);
    let expected = graph
        .contracts
        .iter()
        .map(|c| (c.file_path.clone(), Some(c.name.clone())))
        .collect::<BTreeSet<_>>();
    assert_eq!(leaves, expected);
    assert_eq!(leaves.len(), files.len());
}

#[test]
fn test_calls_dedup_by_target_and_arity() {
    let source = r#"
contract Caller {
    function run() external {
        foo(1, 2);
        foo(1, 2);
        foo(1, 2, 3);
    }
    function foo(uint256 a, uint256 b) internal {}
    function foo(uint256 a, uint256 b, uint256 c) internal {}
}
"#;
    let parsed = parse_solidity_file("src/Caller.sol", source);
    let run = &parsed.contracts[0].external_functions[0];

    let calls = run
        .calls
        .iter()
        .map(|c| (c.call_type, c.target.as_str(), c.arg_count))
        .collect::<Vec<_>>();
    assert_eq!(
        calls,
        vec![
            (CallType::Internal, "foo", Some(2)),
            (CallType::Internal, "foo", Some(3)),
        ]
    );
}
