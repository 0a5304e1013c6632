mod probe;
mod registry;

pub use probe::{PipShowProbe, ProbeError, parse_show_output};
pub use registry::{DistInfoRegistry, discover_site_packages, normalize_name};

/// An installable distribution: canonical registered name plus version, when
/// known. The name may differ from the import name that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Option<String>,
}

/// Outcome of resolving one top-level import name. Nothing here is fatal to
/// a run; the caller turns the non-resolved variants into diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedPackage),
    /// Both tiers ran and neither produced a confident mapping.
    Unresolved,
    /// The external package-manager executable is not on the PATH.
    ToolUnavailable { command: String },
    /// An unexpected spawn or IO failure while querying the external tool.
    Failed { reason: String },
}

pub trait PackageResolver {
    fn resolve(&self, import_name: &str) -> Resolution;
}

/// Installed-metadata lookup: the first resolution tier.
pub trait RegistryLookup {
    fn lookup(&self, import_name: &str) -> Option<ResolvedPackage>;
}

/// External package-manager "show info" query: the second resolution tier.
pub trait PackageProbe {
    fn show(&self, import_name: &str) -> Result<String, ProbeError>;
}

/// Two-tier resolver: exact-match metadata registry first, external tool
/// second, first success wins. Deliberately no manual import-name to
/// distribution-name mapping table anywhere in between; names the tiers
/// cannot account for stay unresolved.
pub struct FallbackResolver<R, P>
where
    R: RegistryLookup,
    P: PackageProbe,
{
    pub registry: R,
    pub probe: P,
}

impl<R, P> PackageResolver for FallbackResolver<R, P>
where
    R: RegistryLookup,
    P: PackageProbe,
{
    fn resolve(&self, import_name: &str) -> Resolution {
        if let Some(package) = self.registry.lookup(import_name) {
            return Resolution::Resolved(package);
        }

        match self.probe.show(import_name) {
            Ok(stdout) => match parse_show_output(&stdout, import_name) {
                Some(package) => Resolution::Resolved(package),
                None => Resolution::Unresolved,
            },
            Err(ProbeError::ToolUnavailable { command }) => {
                Resolution::ToolUnavailable { command }
            }
            Err(ProbeError::CommandFailed { .. }) => Resolution::Unresolved,
            Err(err @ ProbeError::Io { .. }) => Resolution::Failed {
                reason: err.to_string(),
            },
        }
    }
}
