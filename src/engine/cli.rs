//! CLI command handler: defaults → `.seekmin.toml` → flags, then run the pipeline to stdout.

use anyhow::{Result, bail};
use log::debug;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::metrics::Counters;
use crate::pipeline::{FilenameSource, WriterSink, run_pipeline};
use crate::types::Delimiter;
use crate::utils::seekmin_toml::{apply_file_to_opts, load_seekmin_toml};
use crate::utils::setup_logging;

/// Overwrite opts field from a flag when it was given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $cli.$field {
                $opts.$field = v;
            }
        )+
    };
}

/// Merge config layers. `dir` is where the settings file is looked up.
pub fn build_opts(cli: &Cli, dir: &Path) -> Result<Opts> {
    let mut opts = Opts::default();
    if let Some(file) = load_seekmin_toml(dir)? {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_opt!(
        cli,
        opts,
        block_size,
        max_blocks,
        readers,
        hashers,
        queue_cap,
        algorithm,
        verbose,
        stats,
        progress,
    );
    if let Some(null) = cli.null {
        opts.delimiter = if null {
            Delimiter::Nul
        } else {
            Delimiter::Newline
        };
    }
    Ok(opts)
}

/// Hash every named file (or every name on stdin) and print `<digest>  <file>` lines.
/// Fails after all output is written if any file could not be hashed.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = build_opts(cli, Path::new("."))?;
    setup_logging(opts.verbose);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let counters = Arc::new(Counters::new());
    let sink = Arc::new(WriterSink::new(io::stdout()));
    let source = FilenameSource::from_args(cli.files.clone(), opts.delimiter);

    let summary = run_pipeline(&opts, source, sink, counters.clone())?;
    debug!(
        "{} files: {} hashed, {} failed",
        summary.files, summary.hashed, summary.failed
    );

    if opts.stats {
        eprintln!("{}", counters.to_json()?);
    }
    if summary.failed > 0 {
        bail!(
            "{} of {} files could not be hashed",
            summary.failed,
            summary.files
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "seekmin",
            "--block-size",
            "512",
            "-j",
            "3",
            "-z",
            "--algorithm",
            "blake3",
            "a",
            "b",
        ]);
        let opts = build_opts(&cli, dir.path()).unwrap();
        assert_eq!(opts.block_size, 512);
        assert_eq!(opts.hashers, 3);
        assert_eq!(opts.delimiter, Delimiter::Nul);
        assert_eq!(opts.algorithm, crate::HashAlgorithm::Blake3);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".seekmin.toml"),
            "[settings]\nreaders = 2\nmax_blocks = 8\n",
        )
        .unwrap();
        let cli = Cli::parse_from(["seekmin", "--readers", "1"]);
        let opts = build_opts(&cli, dir.path()).unwrap();
        assert_eq!(opts.readers, 1);
        assert_eq!(opts.max_blocks, 8);
    }
}
