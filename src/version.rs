//! Game build detection

use crate::error::{AutosplitterError, Result};
use crate::layout::{BinaryIdentity, LayoutTable, MemoryLayout};

/// Result of matching a process image against the layout table
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub identity: BinaryIdentity,
    pub layout: MemoryLayout,
    /// False when the build was unknown and the fallback layout was chosen
    pub recognized: bool,
}

impl Detection {
    /// User-facing warning for unrecognized builds
    pub fn warning(&self) -> Option<String> {
        if self.recognized {
            None
        } else {
            Some(format!(
                "Unsupported game version (module size {}), falling back to {}; splits may be wrong",
                self.identity.module_size(),
                self.layout.name
            ))
        }
    }
}

/// Selects a memory layout for an attached process
#[derive(Debug, Clone, Default)]
pub struct VersionDetector {
    table: LayoutTable,
    strict: bool,
}

impl VersionDetector {
    pub fn new(table: LayoutTable) -> Self {
        Self {
            table,
            strict: false,
        }
    }

    /// Refuse unknown builds instead of falling back to the earliest layout
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn table(&self) -> &LayoutTable {
        &self.table
    }

    /// Resolve the layout for a process image
    ///
    /// Unknown builds are not fatal unless strict mode is on: a warning is
    /// logged and the earliest known layout is used.
    pub fn detect(&self, identity: BinaryIdentity) -> Result<Detection> {
        if let Some(layout) = self.table.lookup(identity) {
            log::info!(
                "Detected game version {} (module size {})",
                layout.name,
                identity.module_size()
            );
            return Ok(Detection {
                identity,
                layout: layout.clone(),
                recognized: true,
            });
        }

        if self.strict {
            log::warn!(
                "Unsupported game version (module size {}), refusing to attach",
                identity.module_size()
            );
            return Err(AutosplitterError::UnsupportedBinary {
                module_size: identity.module_size(),
            });
        }

        let detection = Detection {
            identity,
            layout: self.table.fallback().clone(),
            recognized: false,
        };
        if let Some(warning) = detection.warning() {
            log::warn!("{}", warning);
        }
        Ok(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_builds() {
        let detector = VersionDetector::default();

        let d = detector.detect(BinaryIdentity(5029888)).unwrap();
        assert!(d.recognized);
        assert_eq!(d.layout.name, "v2014_12_03");
        assert!(d.warning().is_none());

        let d = detector.detect(BinaryIdentity(5033984)).unwrap();
        assert_eq!(d.layout.name, "v2016_01_12");
    }

    #[test]
    fn test_unknown_build_falls_back() {
        let detector = VersionDetector::default();

        let d = detector.detect(BinaryIdentity(4096)).unwrap();
        assert!(!d.recognized);
        assert_eq!(d.layout.name, "v2014_12_03");
        assert!(d.warning().unwrap().contains("4096"));
    }

    #[test]
    fn test_strict_mode_rejects_unknown_build() {
        let detector = VersionDetector::default().strict(true);

        let err = detector.detect(BinaryIdentity(4096)).unwrap_err();
        assert!(matches!(
            err,
            AutosplitterError::UnsupportedBinary { module_size: 4096 }
        ));
        assert!(detector.detect(BinaryIdentity(5033984)).is_ok());
    }
}
