//! Shell completion directives
//!
//! A directive tells the shell script how to treat the candidate list it
//! receives: whether to add a trailing space, whether to fall back to file
//! completion, and whether the candidates are really filter parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of rendering hints, encoded on the wire as a small integer bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directive(u32);

impl Directive {
    /// No special handling: trailing space and file fallback apply.
    pub const DEFAULT: Directive = Directive(0);
    /// Something went wrong; show nothing and do not fall back to files.
    pub const ERROR: Directive = Directive(1);
    /// Do not append a space after the inserted completion.
    pub const NO_SPACE: Directive = Directive(2);
    /// Never fall back to file completion, even with no candidates.
    pub const NO_FILE_COMP: Directive = Directive(4);
    /// Candidates are file extensions (without the dot) to filter files by.
    pub const FILTER_FILE_EXT: Directive = Directive(8);
    /// Complete directories only, optionally below the single candidate path.
    pub const FILTER_DIRS: Directive = Directive(16);

    const ALL_BITS: u32 = 1 | 2 | 4 | 8 | 16;

    const NAMED: [(Directive, &'static str); 5] = [
        (Directive::ERROR, "Error"),
        (Directive::NO_SPACE, "NoSpace"),
        (Directive::NO_FILE_COMP, "NoFileComp"),
        (Directive::FILTER_FILE_EXT, "FilterFileExt"),
        (Directive::FILTER_DIRS, "FilterDirs"),
    ];

    /// Decode a wire bitmask. Undefined bits are rejected.
    pub fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(Directive(bits))
        } else {
            None
        }
    }

    /// The wire bitmask.
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Directive) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_default(self) -> bool {
        self.0 == 0
    }

    pub fn is_error(self) -> bool {
        self.contains(Directive::ERROR)
    }

    /// Whether the candidate list carries filter parameters instead of values.
    pub fn is_filter(self) -> bool {
        self.0 & (Directive::FILTER_FILE_EXT.0 | Directive::FILTER_DIRS.0) != 0
    }

    /// Combine two directives. `Error` absorbs everything else.
    pub fn merge(self, other: Directive) -> Directive {
        if self.is_error() || other.is_error() {
            Directive::ERROR
        } else {
            Directive(self.0 | other.0)
        }
    }
}

impl BitOr for Directive {
    type Output = Directive;

    fn bitor(self, rhs: Directive) -> Directive {
        self.merge(rhs)
    }
}

impl BitOrAssign for Directive {
    fn bitor_assign(&mut self, rhs: Directive) {
        *self = self.merge(rhs);
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("Default");
        }
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}
