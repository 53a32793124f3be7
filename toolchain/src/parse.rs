//! Typed extraction of values from tool output.
//!
//! Every parser is a pure function over the captured text so it can be
//! tested against recorded output. Anything that does not match the
//! expected shape becomes [`ToolError::UnexpectedOutput`].

use elector_types::{
    AccountAddress, ElectionTiming, KeyHandle, Nanotons, Signature, StakeBounds,
};

use crate::error::ToolError;
use crate::{ElectionRequest, NodeStats};

const CONSOLE: &str = "validator-engine-console";
const LITE_CLIENT: &str = "lite-client";
const FIFT: &str = "fift";

/// Token following `marker`, up to the next whitespace.
fn token_after<'a>(output: &'a str, marker: &str) -> Option<&'a str> {
    let start = output.find(marker)? + marker.len();
    output[start..].split_whitespace().next()
}

/// Leading run of ASCII digits after `marker`.
fn digits_after(output: &str, marker: &str) -> Option<u64> {
    let start = output.find(marker)? + marker.len();
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// First `value:N` following `marker` (TL-B `var_uint` dumps).
fn var_uint_after(output: &str, marker: &str) -> Option<u64> {
    let start = output.find(marker)? + marker.len();
    digits_after(&output[start..], "value:")
}

pub fn parse_new_key(output: &str) -> Result<KeyHandle, ToolError> {
    token_after(output, "created new key")
        .map(KeyHandle::new)
        .ok_or_else(|| ToolError::unexpected(CONSOLE, "created new key <handle>", output))
}

pub fn parse_public_key(output: &str) -> Result<KeyHandle, ToolError> {
    token_after(output, "got public key:")
        .map(KeyHandle::new)
        .ok_or_else(|| ToolError::unexpected(CONSOLE, "got public key: <key>", output))
}

pub fn parse_signature(output: &str) -> Result<Signature, ToolError> {
    token_after(output, "got signature")
        .map(Signature::new)
        .ok_or_else(|| ToolError::unexpected(CONSOLE, "got signature <sig>", output))
}

/// Console mutations print `success` and nothing useful otherwise.
pub fn expect_success(output: &str) -> Result<(), ToolError> {
    if output.contains("success") {
        Ok(())
    } else {
        Err(ToolError::unexpected(CONSOLE, "success", output))
    }
}

/// `getstats` prints one `name<TAB>value` pair per line.
pub fn parse_stats(output: &str) -> Result<NodeStats, ToolError> {
    let field = |name: &str| {
        output.lines().find_map(|line| {
            let mut parts = line.split_whitespace();
            (parts.next() == Some(name))
                .then(|| parts.next().and_then(|v| v.parse::<u64>().ok()))
                .flatten()
        })
    };
    match (field("unixtime"), field("masterchainblocktime")) {
        (Some(unixtime), Some(masterchain_block_time)) => Ok(NodeStats {
            unixtime,
            masterchain_block_time,
        }),
        _ => Err(ToolError::unexpected(
            CONSOLE,
            "unixtime and masterchainblocktime",
            output,
        )),
    }
}

/// Config param 1 is dumped as a cell slice `x{HASH}`; the elector lives in
/// the masterchain.
pub fn parse_elector_address(output: &str) -> Result<AccountAddress, ToolError> {
    let hash = output
        .find("x{")
        .map(|i| &output[i + 2..])
        .and_then(|rest| rest.find('}').map(|end| &rest[..end]))
        .filter(|h| h.len() == 64)
        .ok_or_else(|| ToolError::unexpected(LITE_CLIENT, "x{<elector hash>}", output))?;
    Ok(AccountAddress::parse(&format!("-1:{hash}"))?)
}

pub fn parse_election_timing(output: &str) -> Result<ElectionTiming, ToolError> {
    let field = |name: &str| digits_after(output, name);
    match (
        field("validators_elected_for:"),
        field("elections_start_before:"),
        field("elections_end_before:"),
        field("stake_held_for:"),
    ) {
        (Some(elected_for), Some(start_before), Some(end_before), Some(held_for)) => {
            Ok(ElectionTiming {
                validators_elected_for: elected_for,
                elections_start_before: start_before,
                elections_end_before: end_before,
                stake_held_for: held_for,
            })
        }
        _ => Err(ToolError::unexpected(LITE_CLIENT, "ConfigParam(15)", output)),
    }
}

pub fn parse_stake_bounds(output: &str) -> Result<StakeBounds, ToolError> {
    let factor = digits_after(output, "max_stake_factor:").and_then(|f| u32::try_from(f).ok());
    match (
        var_uint_after(output, "min_stake:"),
        var_uint_after(output, "max_stake:"),
        var_uint_after(output, "min_total_stake:"),
        factor,
    ) {
        (Some(min), Some(max), Some(min_total), Some(factor)) => Ok(StakeBounds {
            min_stake: Nanotons::new(min),
            max_stake: Nanotons::new(max),
            min_total_stake: Nanotons::new(min_total),
            max_stake_factor: factor,
        }),
        _ => Err(ToolError::unexpected(LITE_CLIENT, "ConfigParam(17)", output)),
    }
}

/// First value of a `runmethod` result stack, `result:  [ N ]`.
pub fn parse_runmethod_result(output: &str) -> Result<u64, ToolError> {
    let expected = "result: [ <integer> ]";
    let start = output
        .find("result:")
        .ok_or_else(|| ToolError::unexpected(LITE_CLIENT, expected, output))?;
    let rest = output[start + "result:".len()..].trim_start();
    let inner = rest
        .strip_prefix('[')
        .ok_or_else(|| ToolError::unexpected(LITE_CLIENT, expected, output))?;
    inner
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ToolError::unexpected(LITE_CLIENT, expected, output))
}

/// Balance from a `getaccount` dump. An account that was never deployed
/// holds nothing.
pub fn parse_account_balance(output: &str) -> Result<Nanotons, ToolError> {
    if output.contains("account state is empty") {
        return Ok(Nanotons::ZERO);
    }
    var_uint_after(output, "grams:(nanograms")
        .map(Nanotons::new)
        .ok_or_else(|| ToolError::unexpected(LITE_CLIENT, "grams:(nanograms ... value:N)", output))
}

/// `sendfile` acknowledges with the external message status.
pub fn expect_sent(output: &str) -> Result<(), ToolError> {
    match digits_after(output, "external message status is ") {
        Some(1) => Ok(()),
        _ => Err(ToolError::unexpected(
            LITE_CLIENT,
            "external message status is 1",
            output,
        )),
    }
}

/// The request script prints a `Creating ...` banner followed by the hex
/// payload to sign on the next line.
pub fn parse_election_request(output: &str) -> Result<ElectionRequest, ToolError> {
    let expected = "hex payload after \"Creating\"";
    let mut lines = output.lines().skip_while(|l| !l.contains("Creating"));
    lines.next();
    let payload = lines
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty() && hex::decode(l).is_ok())
        .ok_or_else(|| ToolError::unexpected(FIFT, expected, output))?;
    Ok(ElectionRequest::new(payload))
}

/// Path named in `Saved to file <path>`, optionally wrapped in parentheses.
pub fn parse_saved_file(output: &str) -> Result<String, ToolError> {
    let marker = "Saved to file ";
    let start = output
        .find(marker)
        .ok_or_else(|| ToolError::unexpected(FIFT, "Saved to file <path>", output))?;
    let rest = &output[start + marker.len()..];
    let end = rest
        .find(|c: char| c == ')' || c == '\n')
        .unwrap_or(rest.len());
    let path = rest[..end].trim();
    if path.is_empty() {
        return Err(ToolError::unexpected(FIFT, "Saved to file <path>", output));
    }
    Ok(path.to_string())
}
