//! Load `.seekmin.toml` from a directory (CLI only). Lib callers build [`Opts`] directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::engine::digest::HashAlgorithm;
use crate::types::Delimiter;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct SeekminToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    block_size: Option<usize>,
    max_blocks: Option<usize>,
    readers: Option<usize>,
    hashers: Option<usize>,
    queue_cap: Option<usize>,
    filename_queue_cap: Option<usize>,
    delimiter: Option<Delimiter>,
    algorithm: Option<HashAlgorithm>,
    verbose: Option<bool>,
    stats: Option<bool>,
    progress: Option<bool>,
}

/// Parse settings from TOML text. `origin` only labels the error.
pub fn parse_seekmin_toml(s: &str, origin: &Path) -> Result<SeekminToml> {
    toml::from_str(s).with_context(|| format!("parse settings file {}", origin.display()))
}

/// Load the settings file from `dir`. Ok(None) when there is no file; a file that exists
/// but does not parse is an error. Runs before logging is set up, so it does not log.
pub fn load_seekmin_toml(dir: &Path) -> Result<Option<SeekminToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    if !path.is_file() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    parse_seekmin_toml(&s, &path).map(Some)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $section.$field {
                $opts.$field = v;
            }
        )+
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &SeekminToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(
        s,
        opts,
        block_size,
        max_blocks,
        readers,
        hashers,
        queue_cap,
        filename_queue_cap,
        delimiter,
        algorithm,
        verbose,
        stats,
        progress,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let text = r#"
[settings]
block_size = 4096
readers = 2
delimiter = "nul"
algorithm = "blake3"
"#;
        let file = parse_seekmin_toml(text, Path::new("test.toml")).unwrap();
        let mut opts = Opts::default();
        let hashers = opts.hashers;
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.block_size, 4096);
        assert_eq!(opts.readers, 2);
        assert_eq!(opts.delimiter, Delimiter::Nul);
        assert_eq!(opts.algorithm, HashAlgorithm::Blake3);
        assert_eq!(opts.hashers, hashers);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let text = "[settings]\nblocksize = 1\n";
        let err = parse_seekmin_toml(text, Path::new("test.toml")).unwrap_err();
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_seekmin_toml(dir.path()).unwrap().is_none());
    }

    #[test]
    fn file_in_dir_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".seekmin.toml"), "[settings]\nmax_blocks = 3\n").unwrap();
        let file = load_seekmin_toml(dir.path()).unwrap().unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.max_blocks, 3);
    }

    #[test]
    fn empty_file_changes_nothing() {
        let file = parse_seekmin_toml("", Path::new("test.toml")).unwrap();
        let mut opts = Opts::default();
        let before = opts.max_blocks;
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.max_blocks, before);
    }
}
