use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use bcf_codecs::{CodecKind, CODEC_NAMES};
use bcf_core::DEFAULT_BLOCK_SIZE;

/// Contents of a `--config` file.
///
/// ```toml
/// [container]
/// block_size = 262144
/// codec = "zstd"
/// level = 9
/// threads = 4
/// checksum = true
/// ```
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub container: ContainerConfig,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    pub block_size: Option<u32>,
    pub codec: Option<String>,
    pub level: Option<i32>,
    pub threads: Option<usize>,
    pub checksum: Option<bool>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        Self::parse(&text).with_context(|| format!("parsing config file {:?}", path))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line. `None` means the flag was not passed.
#[derive(Debug, Default)]
pub struct Flags {
    pub block_size: Option<u32>,
    pub codec: Option<String>,
    pub level: Option<i32>,
    pub threads: Option<usize>,
    pub no_checksum: bool,
}

/// Fully resolved compression settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub block_size: u32,
    pub codec: CodecKind,
    pub threads: usize,
    pub checksum: bool,
}

impl Settings {
    /// Flags win over the config file, the config file wins over defaults.
    pub fn resolve(file: &ContainerConfig, flags: &Flags) -> anyhow::Result<Self> {
        let block_size = flags
            .block_size
            .or(file.block_size)
            .unwrap_or(DEFAULT_BLOCK_SIZE);
        if block_size == 0 {
            anyhow::bail!("block size must be greater than zero");
        }

        let name = flags
            .codec
            .as_deref()
            .or(file.codec.as_deref())
            .unwrap_or("zstd");
        let level = flags.level.or(file.level);
        let codec = CodecKind::from_name(name, level).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown codec '{}'. Valid options: {}",
                name,
                CODEC_NAMES.join(", ")
            )
        })?;

        let threads = flags.threads.or(file.threads).unwrap_or(1).max(1);
        let checksum = !flags.no_checksum && file.checksum.unwrap_or(true);

        Ok(Self {
            block_size,
            codec,
            threads,
            checksum,
        })
    }
}
