//! Branch derivation from the software-version naming convention.
//!
//! A trailing `<year>.<seq><F|S><build>` marks the line the build came from:
//! `F` is the main/feature line, `S` a stabilization line branched out in
//! that year. Everything else (including the `.0F` feature line itself)
//! reports as `main`.

use regex::Regex;

/// Derive the branch label from a software version string.
///
/// Never fails; an unmatched version is a normal outcome and yields `main`.
pub fn branch_from_sw_version(sw_version: &str) -> String {
    let pattern = Regex::new(r"(\d+\.)(\d+)([SF])\d+").expect("static branch pattern");
    let upper = sw_version.to_uppercase();
    let mut branch = match pattern.captures(&upper) {
        Some(caps) => format!("{}{}{}", &caps[1], &caps[2], &caps[3]),
        None => return "main".to_string(),
    };
    if branch.ends_with(".0F") {
        branch = "main".to_string();
    }
    branch
}
