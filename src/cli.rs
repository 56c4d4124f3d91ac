use argh::FromArgs;

/// First-person portal-sector renderer.
#[derive(Debug, FromArgs)]
pub struct Options {
    /// verbose level: off, error, warn, info, debug
    #[argh(option)]
    pub verbose: Option<log::LevelFilter>,
    /// path to a TOML map file; the built-in map is used when omitted
    #[argh(option)]
    pub map: Option<String>,
    /// horizontal field of view in degrees
    #[argh(option, default = "90.0")]
    pub fov: f32,
    /// window width in pixels
    #[argh(option, default = "800")]
    pub width: u32,
    /// window height in pixels
    #[argh(option, default = "600")]
    pub height: u32,
}
