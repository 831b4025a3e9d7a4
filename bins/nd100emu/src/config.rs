//! Flat key/value configuration (spec §6), grounded in
//! `examples/original_source/nd100lib.c`'s config-line parser: one
//! `key value` pair per line, `#`-prefixed comments ignored.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuType {
    Nd100,
    Nd100ce,
    Nd100cx,
    Nd110,
    Nd110ce,
    Nd110cx,
}

impl FromStr for CpuType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "nd100" => CpuType::Nd100,
            "nd100ce" => CpuType::Nd100ce,
            "nd100cx" => CpuType::Nd100cx,
            "nd110" => CpuType::Nd110,
            "nd110ce" => CpuType::Nd110ce,
            "nd110cx" => CpuType::Nd110cx,
            other => bail!("unrecognized cputype {other:?}"),
        })
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CpuType::Nd100 => "nd100",
            CpuType::Nd100ce => "nd100ce",
            CpuType::Nd100cx => "nd100cx",
            CpuType::Nd110 => "nd110",
            CpuType::Nd110ce => "nd110ce",
            CpuType::Nd110cx => "nd110cx",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootType {
    Bp,
    Bpun,
    Floppy,
}

impl FromStr for BootType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "bp" => BootType::Bp,
            "bpun" => BootType::Bpun,
            "floppy" => BootType::Floppy,
            other => bail!("unrecognized boot type {other:?}"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloppyAccess {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cputype: CpuType,
    pub boot: BootType,
    /// Octal start address for BP/BPUN boots.
    pub start: u16,
    pub debug: bool,
    pub trace: u32,
    pub disasm: bool,
    pub panel: bool,
    pub daemonize: bool,
    pub emulatemon: bool,
    pub floppy_image: Option<PathBuf>,
    pub floppy_image_access: FloppyAccess,
    pub script_console: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cputype: CpuType::Nd100,
            boot: BootType::Bp,
            start: 0,
            debug: false,
            trace: 0,
            disasm: false,
            panel: false,
            daemonize: false,
            emulatemon: false,
            floppy_image: None,
            floppy_image_access: FloppyAccess::ReadOnly,
            script_console: None,
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        let mut cfg = Config::default();
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default().trim();
            cfg.apply(key, value)
                .with_context(|| format!("config line {}: {raw_line:?}", lineno + 1))?;
        }
        Ok(cfg)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cputype" => self.cputype = value.parse()?,
            "boot" => self.boot = value.parse()?,
            "start" => {
                self.start = u16::from_str_radix(value.trim_start_matches('0'), 8).unwrap_or(0);
            }
            "debug" => self.debug = parse_flag(value)?,
            "trace" => self.trace = value.parse().context("trace must be an integer bitmask")?,
            "disasm" => self.disasm = parse_flag(value)?,
            "panel" => self.panel = parse_flag(value)?,
            "daemonize" => self.daemonize = parse_flag(value)?,
            "emulatemon" => self.emulatemon = parse_flag(value)?,
            "floppy_image" => self.floppy_image = Some(PathBuf::from(value)),
            "floppy_image_access" => {
                self.floppy_image_access = match value {
                    "ro" => FloppyAccess::ReadOnly,
                    "rw" => FloppyAccess::ReadWrite,
                    other => bail!("unrecognized floppy_image_access {other:?}"),
                };
            }
            "script_console" => self.script_console = Some(value.to_string()),
            other => bail!("unrecognized config key {other:?}"),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    Ok(value.parse::<i64>().context("expected an integer flag")? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys() {
        let cfg = Config::parse(
            "cputype nd110\nboot floppy\nstart 01000\ndebug 1\nfloppy_image_access rw\n",
        )
        .unwrap();
        assert_eq!(cfg.cputype, CpuType::Nd110);
        assert_eq!(cfg.boot, BootType::Floppy);
        assert_eq!(cfg.start, 0o1000);
        assert!(cfg.debug);
        assert_eq!(cfg.floppy_image_access, FloppyAccess::ReadWrite);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let cfg = Config::parse("# a comment\n\ncputype nd100\n").unwrap();
        assert_eq!(cfg.cputype, CpuType::Nd100);
    }

    #[test]
    fn unrecognized_key_is_an_error() {
        assert!(Config::parse("bogus 1\n").is_err());
    }
}
