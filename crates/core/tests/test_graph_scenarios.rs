use anyhow::{Context, Result};
use solgraph_core::{
    build_call_graph, parse_solidity_files, CallType, ContractKind, DependencyType, FilterOptions,
    PolicyKind, ProxyPattern, ProxyRole, SolidityParser, SourceFile,
};

const IERC20: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

interface IERC20 {
    function transfer(address to, uint256 amount) external returns (bool);
    function balanceOf(address account) external view returns (uint256);
}
"#;

const OWNABLE: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

abstract contract Ownable {
    address internal owner;

    modifier onlyOwner() {
        require(msg.sender == owner, "not owner");
        _;
    }

    function transferOwnership(address next) public onlyOwner {
        owner = next;
    }
}
"#;

const TOKEN: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

import {IERC20} from "./IERC20.sol";
import {Ownable} from "./Ownable.sol";

contract Token is IERC20, Ownable {
    mapping(address => uint256) private balances;

    event Transfer(address indexed from, address indexed to, uint256 value);

    function transfer(address to, uint256 amount) external returns (bool) {
        _transfer(msg.sender, to, amount);
        return true;
    }

    function balanceOf(address account) external view returns (uint256) {
        return balances[account];
    }

    function _transfer(address from, address to, uint256 amount) internal {
        balances[from] -= amount;
        balances[to] += amount;
        emit Transfer(from, to, amount);
    }
}
"#;

#[test]
fn test_erc20_token_graph() -> Result<()> {
    let files = vec![
        SourceFile::new("project/src/IERC20.sol", IERC20),
        SourceFile::new("project/src/Ownable.sol", OWNABLE),
        SourceFile::new("project/src/Token.sol", TOKEN),
    ];
    let contracts = parse_solidity_files(&files, &FilterOptions::default());
    let graph = build_call_graph("erc20", contracts);

    let token = graph.contract("Token").context("Token missing")?;
    assert_eq!(token.kind, ContractKind::Contract);
    assert_eq!(token.implements, vec!["IERC20"]);
    assert_eq!(token.inherits, vec!["Ownable"]);

    assert!(graph.has_dependency("Token", "IERC20", DependencyType::Implements));
    assert!(graph.has_dependency("Token", "Ownable", DependencyType::Inherits));
    assert_eq!(graph.dependencies.len(), 2);

    let inherited = token
        .external_functions
        .iter()
        .find(|f| f.name == "transferOwnership")
        .context("transferOwnership was not inherited")?;
    assert_eq!(inherited.inherited_from.as_deref(), Some("Ownable"));
    assert!(inherited
        .calls
        .iter()
        .any(|c| c.call_type == CallType::Modifier && c.target == "onlyOwner"));

    let transfer = &token.external_functions[0];
    assert_eq!(transfer.name, "transfer");
    assert_eq!(transfer.calls[0].target, "_transfer");
    assert_eq!(transfer.calls[0].call_type, CallType::Internal);
    assert_eq!(token.internal_functions[0].emits, vec!["Transfer"]);

    assert_eq!(graph.stats.total_contracts, 2);
    assert_eq!(graph.stats.total_interfaces, 1);
    assert_eq!(graph.stats.total_libraries, 0);
    assert_eq!(graph.stats.total_functions, 7);

    assert_eq!(graph.structure.name, "src");
    assert_eq!(graph.structure.children.len(), 3);
    assert!(graph.proxy_groups.is_empty());
    Ok(())
}

#[test]
fn test_single_file_erc20() -> Result<()> {
    let source = r#"
interface IERC20 { function transfer(address, uint256) external returns (bool); }
contract Token is IERC20 {
    function transfer(address to, uint256 amt) external returns (bool) { return _transfer(to, amt); }
    function _transfer(address, uint256) internal returns (bool) { return true; }
}
"#;
    let files = vec![SourceFile::new("src/Token.sol", source)];
    let graph = build_call_graph(
        "erc20",
        parse_solidity_files(&files, &FilterOptions::default()),
    );

    assert_eq!(graph.contracts.len(), 2);
    let token = graph.contract("Token").context("Token missing")?;
    assert_eq!(token.implements, vec!["IERC20"]);
    assert_eq!(token.external_functions.len(), 1);

    let transfer = &token.external_functions[0];
    assert_eq!(transfer.name, "transfer");
    assert_eq!(transfer.calls.len(), 1);
    assert_eq!(transfer.calls[0].call_type, CallType::Internal);
    assert_eq!(transfer.calls[0].target, "_transfer");

    assert!(graph.has_dependency("Token", "IERC20", DependencyType::Implements));
    Ok(())
}

#[test]
fn test_rich_policy_library_uses_edge() -> Result<()> {
    let files = vec![
        SourceFile::new(
            "src/SafeMath.sol",
            r#"
library SafeMath {
    function add(uint256 a, uint256 b) internal pure returns (uint256) { return a + b; }
    function sub(uint256 a, uint256 b) internal pure returns (uint256) { return a - b; }
}
"#,
        ),
        SourceFile::new(
            "src/Counter.sol",
            r#"
import "./SafeMath.sol";

contract Counter {
    using SafeMath for uint256;
    uint256 public count;

    function bump(uint256 by) external {
        count = count.add(by);
        count = by.add(count);
    }
}
"#,
        ),
    ];

    let parser = SolidityParser::with_policy(PolicyKind::Rich.build());
    let contracts = parser.parse_files(&files, &FilterOptions::default());
    let graph = build_call_graph("counter", contracts);

    let counter = graph.contract("Counter").context("Counter missing")?;
    assert_eq!(counter.uses_libraries, vec!["SafeMath"]);
    let bump = &counter.external_functions[0];
    assert_eq!(bump.calls.len(), 1);
    assert_eq!(bump.calls[0].call_type, CallType::Library);
    assert_eq!(bump.calls[0].target, "SafeMath.add");

    let uses = graph
        .dependencies
        .iter()
        .find(|d| d.dependency_type == DependencyType::Uses)
        .context("no uses edge")?;
    assert_eq!(uses.from, "Counter");
    assert_eq!(uses.to, "SafeMath");
    assert_eq!(uses.functions.as_deref(), Some(&["add".to_string()][..]));
    assert_eq!(graph.stats.total_libraries, 1);
    Ok(())
}

#[test]
fn test_uups_proxy_roles_and_edges() -> Result<()> {
    let files = vec![
        SourceFile::new(
            "src/VaultProxy.sol",
            r#"
contract VaultProxy {
    address internal implementation;

    function upgradeTo(address next) external {
        implementation = next;
    }
}
"#,
        ),
        SourceFile::new(
            "src/VaultV1.sol",
            r#"
contract VaultV1 {
    function upgradeTo(address next) external {}
    function proxiableUUID() external view returns (bytes32) {}
    function deposit() external payable {}
}
"#,
        ),
        SourceFile::new("src/Unrelated.sol", "contract Unrelated { function f() public {} }"),
    ];
    let graph = build_call_graph(
        "vault",
        parse_solidity_files(&files, &FilterOptions::default()),
    );

    let proxy = graph.contract("VaultProxy").context("proxy missing")?;
    assert_eq!(proxy.proxy_pattern, Some(ProxyPattern::Uups));
    assert_eq!(proxy.proxy_role, Some(ProxyRole::Proxy));

    let implementation = graph.contract("VaultV1").context("implementation missing")?;
    assert_eq!(implementation.proxy_pattern, Some(ProxyPattern::Uups));
    assert_eq!(implementation.proxy_role, Some(ProxyRole::Implementation));

    let unrelated = graph.contract("Unrelated").context("Unrelated missing")?;
    assert_eq!(unrelated.proxy_pattern, None);
    assert_eq!(unrelated.proxy_group_id, None);

    assert_eq!(graph.proxy_groups.len(), 1);
    let group = &graph.proxy_groups[0];
    assert_eq!(group.id, "uups-VaultProxy");
    assert_eq!(group.proxy.as_deref(), Some("VaultProxy"));
    assert_eq!(group.implementations, vec!["VaultV1"]);
    assert_eq!(implementation.proxy_group_id.as_deref(), Some("uups-VaultProxy"));

    assert!(graph.has_dependency("VaultProxy", "VaultV1", DependencyType::Delegatecall));
    Ok(())
}

#[test]
fn test_eip7546_module_layout() -> Result<()> {
    let files = vec![
        SourceFile::new(
            "src/dictionary/Dictionary.sol",
            r#"
contract Dictionary {
    function setImplementation(bytes4 selector, address implementation) external {}
}
"#,
        ),
        SourceFile::new(
            "src/proxy/Proxy.sol",
            "contract ERC7546Proxy { function getDictionary() external view returns (address) {} }",
        ),
        SourceFile::new(
            "src/token/functions/Mint.sol",
            "contract Mint { function mint(uint256 amount) external {} }",
        ),
        SourceFile::new(
            "src/token/functions/Burn.sol",
            "contract Burn { function burn(uint256 amount) external {} }",
        ),
        SourceFile::new(
            "src/token/storages/TokenStorage.sol",
            "contract TokenStorage { uint256 internal supply; }",
        ),
    ];
    let graph = build_call_graph(
        "modules",
        parse_solidity_files(&files, &FilterOptions::default()),
    );

    let module = graph
        .proxy_groups
        .iter()
        .find(|g| g.id == "eip7546-token")
        .context("module group missing")?;
    assert_eq!(module.implementations, vec!["Mint", "Burn"]);

    let core = graph
        .proxy_groups
        .iter()
        .find(|g| g.id == "eip7546-core")
        .context("core group missing")?;
    assert_eq!(core.dictionary.as_deref(), Some("Dictionary"));
    assert_eq!(core.proxy.as_deref(), Some("ERC7546Proxy"));
    assert_eq!(core.implementations, vec!["Mint", "Burn"]);

    let storage = graph.contract("TokenStorage").context("storage missing")?;
    assert_eq!(storage.proxy_group_id.as_deref(), Some("eip7546-token"));
    assert_eq!(storage.proxy_role, None);

    assert!(graph.has_dependency("Dictionary", "Mint", DependencyType::Registers));
    assert!(graph.has_dependency("ERC7546Proxy", "Burn", DependencyType::Delegatecall));
    assert!(graph.has_dependency("ERC7546Proxy", "Dictionary", DependencyType::Uses));
    Ok(())
}

#[test]
fn test_inheritance_cycle_terminates() -> Result<()> {
    let files = vec![SourceFile::new(
        "src/Cycle.sol",
        r#"
contract A is B {
    function a() public {}
}
contract B is A {
    function b() public {}
}
"#,
    )];
    let graph = build_call_graph(
        "cycle",
        parse_solidity_files(&files, &FilterOptions::default()),
    );

    let a = graph.contract("A").context("A missing")?;
    let b = graph.contract("B").context("B missing")?;
    assert!(a.has_function("a") && a.has_function("b"));
    assert!(b.has_function("a") && b.has_function("b"));
    assert_eq!(a.function_count(), 2);
    assert_eq!(b.function_count(), 2);

    assert!(graph.has_dependency("A", "B", DependencyType::Inherits));
    assert!(graph.has_dependency("B", "A", DependencyType::Inherits));
    Ok(())
}

#[test]
fn test_three_contract_cycle_terminates() -> Result<()> {
    let files = vec![SourceFile::new(
        "src/Ring.sol",
        r#"
contract A is B { function a() public {} }
contract B is C { function b() public {} }
contract C is A { function c() public {} }
"#,
    )];
    let graph = build_call_graph(
        "ring",
        parse_solidity_files(&files, &FilterOptions::default()),
    );

    for name in ["A", "B", "C"] {
        let contract = graph.contract(name).context("contract missing")?;
        assert_eq!(contract.function_count(), 3, "{}", name);
    }
    assert_eq!(graph.dependencies.len(), 3);
    Ok(())
}
