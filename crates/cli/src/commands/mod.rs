pub(crate) mod dedup;
pub(crate) mod indexes;
pub(crate) mod scan;

use std::fmt::Display;

use anyhow::Result;
use serde::Serialize;

/// Print a report to stdout, as pretty JSON or in its human-readable form.
pub(crate) fn emit<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
