use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown section code: {0}")]
pub struct UnknownSection(pub String);

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// Topic a question belongs to.
///
/// The set is closed and fixed at deploy time. Persistence and transports use
/// the stable [`Section::code`]; labels are for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "ITJ")]
    Itj,
    #[serde(rename = "ITM")]
    Itm,
    #[serde(rename = "QAJ")]
    Qaj,
    #[serde(rename = "QAM")]
    Qam,
}

struct SectionInfo {
    section: Section,
    code: &'static str,
    label: &'static str,
    summary: &'static str,
}

const SECTIONS: [SectionInfo; 4] = [
    SectionInfo {
        section: Section::Itj,
        code: "ITJ",
        label: "IT. Junior +",
        summary: "Essential IT knowledge.",
    },
    SectionInfo {
        section: Section::Itm,
        code: "ITM",
        label: "IT. Middle +",
        summary: "Advanced IT knowledge.",
    },
    SectionInfo {
        section: Section::Qaj,
        code: "QAJ",
        label: "QA/QC. Junior +",
        summary: "Quality Assurance and Quality Control basics.",
    },
    SectionInfo {
        section: Section::Qam,
        code: "QAM",
        label: "QA/QC. Middle +",
        summary: "In-depth expertise in Quality Assurance and Quality Control.",
    },
];

impl Section {
    /// Every section in menu order.
    pub const ALL: [Section; 4] = [Section::Itj, Section::Itm, Section::Qaj, Section::Qam];

    fn info(self) -> &'static SectionInfo {
        // SECTIONS is declared in the same order as the enum.
        &SECTIONS[self as usize]
    }

    /// Stable, language-independent code (`"QAJ"`).
    #[must_use]
    pub fn code(self) -> &'static str {
        self.info().code
    }

    /// Button label shown in the section menu.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// One-line description used in the section menu.
    #[must_use]
    pub fn summary(self) -> &'static str {
        self.info().summary
    }

    /// Look a section up by its code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        SECTIONS
            .iter()
            .find(|info| info.code.eq_ignore_ascii_case(code))
            .map(|info| info.section)
    }

    /// Look a section up by its exact menu label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        SECTIONS
            .iter()
            .find(|info| info.label == label)
            .map(|info| info.section)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownSection(s.to_string()))
    }
}
