//! Package managers the dependency installer can drive.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// JavaScript package managers.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PackageManager {
    /// `npm`, the fallback when nothing else is detected.
    #[default]
    Npm,
    /// `yarn`.
    Yarn,
    /// `pnpm`.
    Pnpm,
    /// `bun`.
    Bun,
}

impl PackageManager {
    /// Executable name resolved through `PATH`.
    ///
    /// npm, yarn and pnpm ship `.cmd` shims on Windows.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match (self, cfg!(windows)) {
            (Self::Npm, false) => "npm",
            (Self::Npm, true) => "npm.cmd",
            (Self::Yarn, false) => "yarn",
            (Self::Yarn, true) => "yarn.cmd",
            (Self::Pnpm, false) => "pnpm",
            (Self::Pnpm, true) => "pnpm.cmd",
            (Self::Bun, _) => "bun",
        }
    }

    /// Subcommand adding packages to the manifest.
    #[must_use]
    pub const fn add_subcommand(self) -> &'static str {
        match self {
            Self::Npm => "install",
            Self::Yarn | Self::Pnpm | Self::Bun => "add",
        }
    }

    /// Flag marking packages as development dependencies.
    #[must_use]
    pub const fn dev_flag(self) -> &'static str {
        match self {
            Self::Npm | Self::Pnpm => "--save-dev",
            Self::Yarn | Self::Bun => "--dev",
        }
    }

    /// Lock files identifying this package manager, in priority order.
    #[must_use]
    pub const fn lock_files(self) -> &'static [&'static str] {
        match self {
            Self::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
            Self::Yarn => &["yarn.lock"],
            Self::Pnpm => &["pnpm-lock.yaml"],
            Self::Bun => &["bun.lockb", "bun.lock"],
        }
    }

    /// Detection order used when probing lock files.
    #[must_use]
    pub const fn detection_order() -> &'static [Self] {
        &[Self::Pnpm, Self::Yarn, Self::Bun, Self::Npm]
    }
}

/// Errors encountered while parsing a [`PackageManager`] from text.
pub type PackageManagerParseError = strum::ParseError;
