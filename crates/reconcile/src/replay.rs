//! Block replay planning.
//!
//! Replays are sent as one request per chain, each listing the ids of the
//! deployed functions on that chain.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::{RemoteFunction, ReplayBlocks};
use std::collections::BTreeMap;

fn parse_hex(digits: &str, original: &str) -> Result<u64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Validation(format!("Invalid hex string: {original}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Validation(format!("Invalid hex string {original}: {e}")))
}

fn parse_decimal(value: &str) -> Result<u64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(format!("Invalid decimal string: {value}")));
    }
    value
        .parse()
        .map_err(|e| Error::Validation(format!("Invalid decimal string {value}: {e}")))
}

/// Parse a block number written in decimal or as `0x`-prefixed hex.
pub fn parse_block_number(value: &str) -> Result<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(digits) => parse_hex(digits, value),
        None => parse_decimal(value),
    }
}

/// Convert hex to decimal or decimal to hex.
///
/// A value is read as hex when it carries a `0x` prefix or contains any of
/// the letters `a-f`; the result is then decimal. Anything else is read as
/// decimal and rendered as `0x`-prefixed lowercase hex.
pub fn convert_hex_or_decimal(value: &str) -> Result<String> {
    let value = value.trim();
    if let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return Ok(parse_hex(digits, value)?.to_string());
    }
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return Ok(parse_hex(value, value)?.to_string());
    }
    Ok(format!("{:#x}", parse_decimal(value)?))
}

/// Requests to send plus the functions that had to be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayPlan {
    /// One request per chain, ordered by chain id.
    pub requests: Vec<ReplayBlocks>,
    /// Declared functions that are not deployed.
    pub not_deployed: Vec<String>,
}

/// Group the requested functions into per-chain replay requests.
///
/// An empty `requested` list means every declared function. Naming a
/// function that is not declared is an error; declared functions that are not
/// deployed are skipped with a warning.
pub fn plan_replay(
    declared: &[String],
    requested: &[String],
    deployed: &BTreeMap<String, RemoteFunction>,
    start: &str,
    end: &str,
) -> Result<ReplayPlan> {
    let start_block_number = parse_block_number(start)?;
    let end_block_number = parse_block_number(end)?;
    if start_block_number > end_block_number {
        return Err(Error::Validation(format!(
            "Start block {start_block_number} is after end block {end_block_number}"
        )));
    }

    let names = if requested.is_empty() {
        declared
    } else {
        if let Some(unknown) = requested.iter().find(|name| !declared.contains(name)) {
            return Err(Error::Validation(format!(
                "Function {unknown} not found in spec"
            )));
        }
        requested
    };

    let mut plan = ReplayPlan::default();
    let mut by_chain: BTreeMap<&str, ReplayBlocks> = BTreeMap::new();
    for name in names {
        let Some(function) = deployed.get(name) else {
            log::warn!("Function {name} not deployed, skipping...");
            plan.not_deployed.push(name.clone());
            continue;
        };
        by_chain
            .entry(function.chain_id.as_str())
            .or_insert_with(|| ReplayBlocks {
                chain_id: function.chain_id.clone(),
                start_block_number,
                end_block_number,
                functions: Vec::new(),
            })
            .functions
            .push(function.function_id.clone());
    }
    plan.requests = by_chain.into_values().collect();
    Ok(plan)
}

/// Send every request of a plan, stopping at the first failure.
pub fn replay(gateway: &dyn Gateway, plan: &ReplayPlan) -> Result<()> {
    for request in &plan.requests {
        log::info!(
            "Replaying blocks {}..{} on {} for {} function(s)",
            request.start_block_number,
            request.end_block_number,
            request.chain_id,
            request.functions.len()
        );
        gateway.replay_blocks(request).map_err(|e| {
            Error::mutation(format!("replaying blocks on chain {}", request.chain_id), e)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Call, MockGateway};

    fn remote(id: &str, name: &str, chain: &str) -> RemoteFunction {
        RemoteFunction {
            function_id: id.to_string(),
            function_name: name.to_string(),
            chain_id: chain.to_string(),
            triggers: vec![],
            webhook_id: "w-1".to_string(),
            is_enabled: true,
            should_send_std_streams: None,
            description: None,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn deployed() -> BTreeMap<String, RemoteFunction> {
        [
            remote("f-1", "a", "CHAIN_ETH_MAINNET"),
            remote("f-2", "b", "CHAIN_ETH_MAINNET"),
            remote("f-3", "c", "CHAIN_BASE_MAINNET"),
        ]
        .into_iter()
        .map(|f| (f.function_name.clone(), f))
        .collect()
    }

    #[test]
    fn test_parse_block_number() {
        assert_eq!(parse_block_number("0x10").unwrap(), 16);
        assert_eq!(parse_block_number("16").unwrap(), 16);
        assert_eq!(parse_block_number("0XfF").unwrap(), 255);
        assert!(parse_block_number("0x").is_err());
        assert!(parse_block_number("0xzz").is_err());
        assert!(parse_block_number("12a").is_err());
        assert!(parse_block_number("").is_err());
    }

    #[test]
    fn test_convert_hex_or_decimal() {
        assert_eq!(convert_hex_or_decimal("0x10").unwrap(), "16");
        assert_eq!(convert_hex_or_decimal("ff").unwrap(), "255");
        assert_eq!(convert_hex_or_decimal("255").unwrap(), "0xff");
        assert_eq!(convert_hex_or_decimal("0").unwrap(), "0x0");
        assert!(convert_hex_or_decimal("xyz").is_err());
        assert!(convert_hex_or_decimal("-1").is_err());
    }

    #[test]
    fn test_plan_groups_by_chain() {
        let declared = names(&["a", "b", "c", "d"]);
        let plan = plan_replay(&declared, &[], &deployed(), "0x10", "32").unwrap();

        assert_eq!(plan.not_deployed, names(&["d"]));
        assert_eq!(plan.requests.len(), 2);
        assert_eq!(plan.requests[0].chain_id, "CHAIN_BASE_MAINNET");
        assert_eq!(plan.requests[0].functions, names(&["f-3"]));
        assert_eq!(plan.requests[1].chain_id, "CHAIN_ETH_MAINNET");
        assert_eq!(plan.requests[1].functions, names(&["f-1", "f-2"]));
        assert_eq!(plan.requests[1].start_block_number, 16);
        assert_eq!(plan.requests[1].end_block_number, 32);
    }

    #[test]
    fn test_plan_subset_and_unknown() {
        let declared = names(&["a", "b", "c"]);
        let plan = plan_replay(&declared, &names(&["b"]), &deployed(), "1", "2").unwrap();
        assert_eq!(plan.requests.len(), 1);
        assert_eq!(plan.requests[0].functions, names(&["f-2"]));

        let err = plan_replay(&declared, &names(&["zzz"]), &deployed(), "1", "2").unwrap_err();
        assert_eq!(err.to_string(), "Function zzz not found in spec");
    }

    #[test]
    fn test_plan_rejects_inverted_range() {
        let declared = names(&["a"]);
        assert!(plan_replay(&declared, &[], &deployed(), "10", "9").is_err());
    }

    #[test]
    fn test_replay_sends_one_call_per_chain() {
        let mock = MockGateway::new();
        let declared = names(&["a", "b", "c"]);
        let plan = plan_replay(&declared, &[], &deployed(), "1", "2").unwrap();
        replay(&mock, &plan).unwrap();
        assert_eq!(
            mock.mutations(),
            vec![
                Call::ReplayBlocks("CHAIN_BASE_MAINNET".to_string()),
                Call::ReplayBlocks("CHAIN_ETH_MAINNET".to_string()),
            ]
        );

        mock.fail_on("CHAIN_ETH_MAINNET");
        let err = replay(&mock, &plan).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Error occurred while replaying blocks on chain CHAIN_ETH_MAINNET")
        );
    }
}
