//! Extraction of launcher-relevant flags from the child argument vector
//!
//! Everything after `--` on the launcher command line belongs to the
//! validator binary and is forwarded verbatim. The launcher itself only
//! needs three of those flags to locate the keystore tree; extraction is
//! non-destructive and ignores everything it does not recognize.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// The flags the launcher extracts from the child argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildFlags {
    pub datadir: PathBuf,
    pub network: String,
    pub secrets_dir: Option<PathBuf>,
}

impl ChildFlags {
    /// Extract `--datadir`, `--network` and `--secrets-dir` from `args`.
    ///
    /// Both the `--flag value` and `--flag=value` forms are accepted, and
    /// the last occurrence wins. Unknown arguments are passed over without
    /// error. A missing or empty `--datadir` or `--network` is an error;
    /// `--secrets-dir` is optional.
    pub fn parse(args: &[String]) -> Result<Self> {
        let datadir = extract_value(args, "--datadir")
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingFlag("--datadir"))?;
        let network = extract_value(args, "--network")
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingFlag("--network"))?;
        let secrets_dir = extract_value(args, "--secrets-dir")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            datadir: PathBuf::from(datadir),
            network,
            secrets_dir,
        })
    }
}

fn extract_value(args: &[String], flag: &str) -> Option<String> {
    let mut found = None;
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if arg == flag {
            if let Some(value) = iter.peek() {
                found = Some((*value).clone());
                iter.next();
            }
        } else if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            found = Some(value.to_string());
        }
    }
    found
}

/// Whether `flag` appears in `args`, in either the bare or `=value` form.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}
