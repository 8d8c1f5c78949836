use crate::Result;
use crate::app::{CreatePolicy, NoteService};
use crate::backends::{CacheFileBackend, FilesystemBackend};
use crate::http::{ServerConfig, UploadPage};

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    backend: Backend,
}

#[derive(Subcommand, Debug)]
enum Backend {
    /// Store every note as a file inside a directory
    Files {
        /// Address to listen on
        #[arg(default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(default_value_t = 3000)]
        port: u16,
        /// Directory holding one file per note
        #[arg(default_value = "./cache")]
        cache_dir: PathBuf,
    },
    /// Keep notes in memory and mirror them to a JSON cache file
    // `-h` is the host here, so help is long-only
    #[command(disable_help_flag = true)]
    Cache {
        /// Address to listen on
        #[arg(short = 'h', long)]
        host: String,
        /// Port to listen on
        #[arg(short, long)]
        port: u16,
        /// JSON file holding all notes
        #[arg(short, long)]
        cache: PathBuf,
        /// Print help
        #[arg(long, action = ArgAction::Help)]
        help: Option<bool>,
    },
}

/// Parses command-line arguments, exiting with status 1 on any usage error
///
/// `--help` and `--version` still print and exit with status 0
#[must_use]
pub fn parse_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            process::exit(1)
        }
    })
}

/// Opens the backend chosen on the command line and wraps it in a `ServerConfig`
///
/// # Errors
///
/// - `BackendError::DirectoryCreationError` if the notes directory cannot be created
/// - `BackendError::CacheRead` or `BackendError::CacheParse` if an existing cache file is unusable
/// - `BackendError::CacheWrite` if a new cache file cannot be written
pub fn build_config(args: Args) -> Result<ServerConfig> {
    debug!("Arguments received: {args:?}");

    // Allow any struct that implements NoteBackend, and store on heap because size is unknown at compile time
    let config = match args.backend {
        Backend::Files {
            host,
            port,
            cache_dir,
        } => ServerConfig {
            host,
            port,
            service: NoteService::new(
                Box::new(FilesystemBackend::new(&cache_dir)?),
                CreatePolicy::RequireFields,
            ),
            upload_page: UploadPage::Form,
        },
        Backend::Cache {
            host, port, cache, ..
        } => ServerConfig {
            host,
            port,
            service: NoteService::new(
                Box::new(CacheFileBackend::open(&cache)?),
                CreatePolicy::Lenient,
            ),
            upload_page: UploadPage::Instructions,
        },
    };
    Ok(config)
}

/// Parses command-line arguments and opens the chosen backend
///
/// # Errors
///
/// Forwards any error from `build_config`
pub fn handle_args() -> Result<ServerConfig> {
    build_config(parse_args())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("noters-http").chain(args.iter().copied()))
    }

    #[test]
    fn files_defaults() {
        let args = parse(&["files"]).unwrap();
        match args.backend {
            Backend::Files {
                host,
                port,
                cache_dir,
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
                assert_eq!(cache_dir, PathBuf::from("./cache"));
            }
            Backend::Cache { .. } => panic!("expected files backend"),
        }
    }

    #[test]
    fn files_positional_overrides() {
        let args = parse(&["files", "0.0.0.0", "8080", "/tmp/notes"]).unwrap();
        assert!(matches!(
            args.backend,
            Backend::Files { ref host, port: 8080, ref cache_dir }
                if host == "0.0.0.0" && cache_dir == &PathBuf::from("/tmp/notes")
        ));
    }

    #[test]
    fn cache_short_and_long_flags() {
        for argv in [
            ["cache", "-h", "localhost", "-p", "4000", "-c", "notes.json"],
            ["cache", "--host", "localhost", "--port", "4000", "--cache", "notes.json"],
        ] {
            let args = parse(&argv).unwrap();
            assert!(matches!(
                args.backend,
                Backend::Cache { ref host, port: 4000, ref cache, .. }
                    if host == "localhost" && cache == &PathBuf::from("notes.json")
            ));
        }
    }

    #[test]
    fn cache_requires_every_flag() {
        for argv in [
            vec!["cache", "--port", "4000", "--cache", "notes.json"],
            vec!["cache", "--host", "localhost", "--cache", "notes.json"],
            vec!["cache", "--host", "localhost", "--port", "4000"],
        ] {
            let err = parse(&argv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn rejects_bad_port() {
        assert!(parse(&["files", "127.0.0.1", "not-a-port"]).is_err());
        assert!(parse(&["cache", "-h", "x", "-p", "70000", "-c", "c.json"]).is_err());
    }

    #[test]
    fn build_config_picks_variant() {
        let dir = tempfile::tempdir().unwrap();

        let notes_dir = dir.path().join("notes");
        let args = parse(&["files", "127.0.0.1", "3000", notes_dir.to_str().unwrap()]).unwrap();
        let config = build_config(args).unwrap();
        assert_eq!(config.upload_page, UploadPage::Form);
        assert_eq!(config.service.policy(), CreatePolicy::RequireFields);
        assert!(notes_dir.is_dir());

        let cache = dir.path().join("notes.json");
        let args = parse(&["cache", "-h", "127.0.0.1", "-p", "3000", "-c", cache.to_str().unwrap()])
            .unwrap();
        let config = build_config(args).unwrap();
        assert_eq!(config.upload_page, UploadPage::Instructions);
        assert_eq!(config.service.policy(), CreatePolicy::Lenient);
        assert!(cache.is_file());
    }

    #[test]
    fn build_config_fails_on_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("notes.json");
        std::fs::write(&cache, "not json").unwrap();

        let args = parse(&["cache", "-h", "127.0.0.1", "-p", "3000", "-c", cache.to_str().unwrap()])
            .unwrap();
        assert!(build_config(args).is_err());
    }
}
