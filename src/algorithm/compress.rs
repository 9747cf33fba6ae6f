use strum::{AsRefStr, EnumString};

/// SSH compression algorithms in the KEXINIT name-list.
///
/// Compression codecs are a non-goal; `None` is the only variant this
/// crate is able to negotiate, kept so the KEXINIT wire structure (a
/// mandatory name-list pair) remains complete.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Compress {
    /// No compression.
    #[default]
    None,
}
