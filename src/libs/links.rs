use clap::ValueEnum;
use std::fmt;

/// Places BunnyPad and its add-ons can be downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadOption {
    /// Packaged stable release on itch.io
    StableRelease,
    /// Source code of the latest stable release
    StableSource,
    /// Latest CarrotPatch (pre-release) build
    Carrotpatch,
    /// Icon packs for the customizer
    IconPacks,
    /// Stylesheets for the customizer
    Stylesheets,
    /// r3dfox browser releases
    R3dfox,
}

impl DownloadOption {
    pub const ALL: [DownloadOption; 6] = [
        DownloadOption::StableRelease,
        DownloadOption::StableSource,
        DownloadOption::Carrotpatch,
        DownloadOption::IconPacks,
        DownloadOption::Stylesheets,
        DownloadOption::R3dfox,
    ];

    pub fn url(self) -> &'static str {
        match self {
            DownloadOption::StableRelease => "https://garrystraityt.itch.io/bunnypad",
            DownloadOption::StableSource | DownloadOption::Carrotpatch => "https://github.com/GSYT-Productions/BunnyPad-SRC/",
            DownloadOption::IconPacks => "https://gsyt-productions.github.io/BunnyPadCustomizer/IconPacks",
            DownloadOption::Stylesheets => "https://gsyt-productions.github.io/BunnyPadCustomizer/stylesheets",
            DownloadOption::R3dfox => "https://github.com/Eclipse-Community/r3dfox/releases/",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DownloadOption::StableRelease => "Latest Stable Release",
            DownloadOption::StableSource => "Latest Stable Source",
            DownloadOption::Carrotpatch => "Latest CarrotPatch Build",
            DownloadOption::IconPacks => "IconPacks",
            DownloadOption::Stylesheets => "Stylesheets",
            DownloadOption::R3dfox => "r3dfox Download",
        }
    }
}

impl fmt::Display for DownloadOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
