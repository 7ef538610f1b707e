//! Tables printed by the CLI.

use alloy_core::primitives::Address;
use comfy_table::{Table, presets::UTF8_FULL};
use proxyup_deploy::{DeployedProxy, PatternTag, UpgradeResult};

fn table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn or_none(address: Option<Address>) -> String {
    address.map_or_else(|| "-".to_string(), |a| a.to_string())
}

pub fn deployed(deployed: &DeployedProxy) -> Table {
    let mut table = table(["Field", "Value"]);
    table.add_row(["Pattern".to_string(), deployed.pattern.to_string()]);
    table.add_row(["Proxy".to_string(), deployed.proxy.address.to_string()]);
    table.add_row([
        format!("Implementation ({})", deployed.implementation.name),
        deployed.implementation.address.to_string(),
    ]);
    if let Some(beacon) = &deployed.beacon {
        table.add_row(["Beacon".to_string(), beacon.address.to_string()]);
    }
    table.add_row(["Proxy tx".to_string(), deployed.proxy_tx_hash.to_string()]);
    table.add_row(["Gas used".to_string(), deployed.gas_used.to_string()]);
    table
}

pub fn upgraded(result: &UpgradeResult) -> Table {
    let mut table = table(["Field", "Value"]);
    table.add_row(["Proxy".to_string(), result.proxy.address.to_string()]);
    table.add_row(["Pattern".to_string(), result.proxy.pattern.to_string()]);
    table.add_row(["Upgraded through".to_string(), result.admin_target().to_string()]);
    table.add_row(["Old implementation".to_string(), or_none(result.old_implementation)]);
    table.add_row([
        format!("New implementation ({})", result.new_implementation.name),
        result.new_implementation.address.to_string(),
    ]);
    table.add_row([
        "Observed after upgrade".to_string(),
        or_none(result.post_upgrade_implementation),
    ]);
    table.add_row([
        "Upgrade tx".to_string(),
        result.upgrade_transaction_hash.to_string(),
    ]);
    table
}

pub fn detected(
    proxy: Address,
    tag: PatternTag,
    implementation: Option<Address>,
    beacon: Option<Address>,
) -> Table {
    let mut table = table(["Field", "Value"]);
    table.add_row(["Address".to_string(), proxy.to_string()]);
    table.add_row(["Pattern".to_string(), tag.to_string()]);
    table.add_row(["Implementation".to_string(), or_none(implementation)]);
    table.add_row(["Beacon".to_string(), or_none(beacon)]);
    table
}

pub fn accounts(accounts: &[Address]) -> Table {
    let mut table = table(["#", "Account"]);
    for (i, account) in accounts.iter().enumerate() {
        table.add_row([i.to_string(), account.to_string()]);
    }
    table
}
