//! Chain spec tokenizer.
//!
//! A chain spec is a `->`-separated sequence of command invocations, each an
//! optional run of positional arguments after the command name:
//! `clean -> build target=release -> package`.

use anyhow::{anyhow, Result};

/// The token separating links in a chain spec.
pub const CHAIN_SEPARATOR: &str = "->";

/// Tokenizes a chain spec into an ordered list of `[name, arg...]` invocations.
///
/// Empty input yields an empty list. Arguments are split shell-style, so quoted
/// values may contain whitespace.
pub fn parse_chain(chain: &str) -> Result<Vec<Vec<String>>> {
    let mut links = Vec::new();

    if chain.trim().is_empty() {
        return Ok(links);
    }

    for part in chain.split(CHAIN_SEPARATOR) {
        let link = part.trim();
        if link.is_empty() {
            return Err(anyhow!("empty link in command chain: '{}'", chain));
        }

        let fields = shlex::split(link)
            .ok_or_else(|| anyhow!("failed to tokenize chain link: '{}'", link))?;
        if fields.is_empty() {
            return Err(anyhow!("empty link in command chain: '{}'", chain));
        }

        links.push(fields);
    }

    Ok(links)
}
