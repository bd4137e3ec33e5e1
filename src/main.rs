use anyhow::Result;
use clap::Parser;
use remir::registry::{DEFAULT_PRIVATE_REGISTRY, DEFAULT_PUBLIC_REGISTRY, Registries};
use std::path::PathBuf;

/// remir - Registry Mirror Rewriter
///
/// Rewrite a dependency-lock metadata file so that references to a private
/// registry point at its public mirror, after verifying every affected
/// package version against the locally downloaded archives.
///
/// Examples:
///   remir muon-impl-0.13.1                      # validate only (default)
///   remir muon-impl-0.13.1 --check-only false   # validate and rewrite
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Package to process, as "<name>-<version>" (e.g., muon-impl-0.13.1)
    #[arg(value_name = "NAME-VERSION")]
    name_version: String,

    /// Only check availability; do not rewrite the metadata file
    #[arg(
        long,
        value_name = "BOOL",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    check_only: bool,

    /// Directory holding downloaded archives and metadata files (also via REMIR_DOWNLOADS)
    #[arg(
        long,
        value_name = "PATH",
        env = "REMIR_DOWNLOADS",
        default_value = "downloads"
    )]
    downloads: PathBuf,

    /// Private registry index URL to rewrite away from
    #[arg(long, value_name = "URL", default_value = DEFAULT_PRIVATE_REGISTRY)]
    private_registry: String,

    /// Public mirror index URL to rewrite to
    #[arg(long, value_name = "URL", default_value = DEFAULT_PUBLIC_REGISTRY)]
    public_registry: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = remir::runtime::RealRuntime;

    let registries = Registries {
        private: cli.private_registry,
        public: cli.public_registry,
    };

    remir::rewrite::run(
        &runtime,
        &cli.name_version,
        &cli.downloads,
        &registries,
        cli.check_only,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["remir", "muon-impl-0.13.1"]).unwrap();
        assert_eq!(cli.name_version, "muon-impl-0.13.1");
        assert!(cli.check_only);
        assert_eq!(cli.downloads, PathBuf::from("downloads"));
        assert_eq!(cli.private_registry, DEFAULT_PRIVATE_REGISTRY);
        assert_eq!(cli.public_registry, DEFAULT_PUBLIC_REGISTRY);
    }

    #[test]
    fn test_cli_check_only_flag_forms() {
        let cli = Cli::try_parse_from(["remir", "pkg-1.0.0", "--check-only"]).unwrap();
        assert!(cli.check_only);

        let cli = Cli::try_parse_from(["remir", "pkg-1.0.0", "--check-only", "false"]).unwrap();
        assert!(!cli.check_only);

        let cli = Cli::try_parse_from(["remir", "pkg-1.0.0", "--check-only=false"]).unwrap();
        assert!(!cli.check_only);
    }

    #[test]
    fn test_cli_registry_overrides() {
        let cli = Cli::try_parse_from([
            "remir",
            "pkg-1.0.0",
            "--private-registry",
            "sparse+https://a/",
            "--public-registry",
            "sparse+https://b/",
        ])
        .unwrap();
        assert_eq!(cli.private_registry, "sparse+https://a/");
        assert_eq!(cli.public_registry, "sparse+https://b/");
    }

    #[test]
    fn test_cli_downloads_override() {
        let cli =
            Cli::try_parse_from(["remir", "pkg-1.0.0", "--downloads", "/tmp/cache"]).unwrap();
        assert_eq!(cli.downloads, PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_cli_requires_name_version() {
        assert!(Cli::try_parse_from(["remir"]).is_err());
    }
}
