use clap::ValueEnum;
use std::fmt;

use crate::error::{ComposeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CenterStyle {
    /// Logo, if any, floats over the modules.
    #[default]
    None,
    /// Blank cut-out in the centre.
    #[value(name = "empty")]
    EmptyCutout,
    /// Logo placed inside the centre cut-out.
    #[value(name = "logo")]
    LogoCutout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogoShape {
    Circle,
    #[default]
    Rounded,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogoSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl LogoSize {
    /// Edge length on the base canvas.
    pub fn pixels(self) -> u32 {
        match self {
            LogoSize::Small => 48,
            LogoSize::Medium => 64,
            LogoSize::Large => 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogoStyle {
    pub shape: LogoShape,
    pub size: LogoSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSafety {
    Safe,
    Risky,
}

impl fmt::Display for ScanSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSafety::Safe => write!(f, "Safe"),
            ScanSafety::Risky => write!(f, "Risky"),
        }
    }
}

/// A cut-out is always safe at level H; only a large logo drawn straight
/// over the modules is risky.
pub fn classify_scan_safety(center: CenterStyle, has_logo: bool, size: LogoSize) -> ScanSafety {
    if center != CenterStyle::None || !has_logo {
        return ScanSafety::Safe;
    }
    match size {
        LogoSize::Large => ScanSafety::Risky,
        LogoSize::Small | LogoSize::Medium => ScanSafety::Safe,
    }
}

pub fn resolve_center_style(requested: CenterStyle, has_logo: bool) -> Result<CenterStyle> {
    if requested == CenterStyle::LogoCutout && !has_logo {
        return Err(ComposeError::InvalidState);
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CENTERS: [CenterStyle; 3] = [
        CenterStyle::None,
        CenterStyle::EmptyCutout,
        CenterStyle::LogoCutout,
    ];
    const ALL_SIZES: [LogoSize; 3] = [LogoSize::Small, LogoSize::Medium, LogoSize::Large];

    #[test]
    fn test_scan_safety_table() {
        for center in ALL_CENTERS {
            for has_logo in [false, true] {
                for size in ALL_SIZES {
                    let expected =
                        if center == CenterStyle::None && has_logo && size == LogoSize::Large {
                            ScanSafety::Risky
                        } else {
                            ScanSafety::Safe
                        };
                    assert_eq!(
                        classify_scan_safety(center, has_logo, size),
                        expected,
                        "{:?} / logo={} / {:?}",
                        center,
                        has_logo,
                        size
                    );
                }
            }
        }
    }

    #[test]
    fn test_resolve_center_style() {
        assert!(matches!(
            resolve_center_style(CenterStyle::LogoCutout, false),
            Err(ComposeError::InvalidState)
        ));
        assert_eq!(
            resolve_center_style(CenterStyle::LogoCutout, true).unwrap(),
            CenterStyle::LogoCutout
        );
        assert_eq!(
            resolve_center_style(CenterStyle::EmptyCutout, false).unwrap(),
            CenterStyle::EmptyCutout
        );
    }

    #[test]
    fn test_logo_pixels() {
        assert_eq!(LogoSize::Small.pixels(), 48);
        assert_eq!(LogoSize::Medium.pixels(), 64);
        assert_eq!(LogoSize::Large.pixels(), 80);
    }

    #[test]
    fn test_value_names() {
        assert_eq!(
            CenterStyle::from_str("empty", true).unwrap(),
            CenterStyle::EmptyCutout
        );
        assert_eq!(CenterStyle::from_str("logo", true).unwrap(), CenterStyle::LogoCutout);
        assert_eq!(LogoShape::from_str("Circle", true).unwrap(), LogoShape::Circle);
    }
}
