//! Scale vendor identification
//!
//! Device descriptions reported by the OS ("USB-SERIAL CH340 (COM3)",
//! "Toledo Prix 4 Uno", ...) are matched against an ordered table of brand
//! name fragments. The first entry whose fragment appears in the description
//! (case-insensitive) names the vendor. The table is plain data so new
//! brands can be added from configuration without code changes.

use serde::{Deserialize, Serialize};

/// One brand fragment and the vendor it identifies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorEntry {
    /// Text to look for in device descriptions (compared case-insensitively)
    pub fragment: String,
    /// Vendor name reported as the hint
    pub vendor: String,
}

impl VendorEntry {
    pub fn new(fragment: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into().to_lowercase(),
            vendor: vendor.into(),
        }
    }
}

/// Built-in brands, most specific fragments first
const BUILTIN: &[(&str, &str)] = &[
    ("mettler", "Mettler Toledo"),
    ("prix", "Toledo"),
    ("toledo", "Toledo"),
    ("filizola", "Filizola"),
    ("urano", "Urano"),
    ("elgin", "Elgin"),
    ("balmak", "Balmak"),
    ("ramuza", "Ramuza"),
    ("welmy", "Welmy"),
    ("micheletti", "Micheletti"),
    ("marte", "Marte"),
    ("líder", "Líder"),
    ("lider", "Líder"),
    ("alfa instrumentos", "Alfa Instrumentos"),
    ("bizerba", "Bizerba"),
];

/// Ordered brand lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTable {
    entries: Vec<VendorEntry>,
}

impl VendorTable {
    /// Create a table containing only the given entries
    pub fn new(entries: Vec<VendorEntry>) -> Self {
        Self { entries }
    }

    /// Extra entries are checked before the built-in ones
    pub fn with_extra(extra: impl IntoIterator<Item = VendorEntry>) -> Self {
        let mut table = Self::new(extra.into_iter().collect());
        table.entries.extend(Self::default().entries);
        table
    }

    /// Entries in match order
    pub fn entries(&self) -> &[VendorEntry] {
        &self.entries
    }

    /// Find the vendor named by a free-text device description
    pub fn match_description(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.entries
            .iter()
            .find(|e| !e.fragment.is_empty() && haystack.contains(&e.fragment.to_lowercase()))
            .map(|e| e.vendor.as_str())
    }

    /// Try several descriptions in order, returning the first hit
    pub fn match_any<'a, I>(&self, descriptions: I) -> Option<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        descriptions
            .into_iter()
            .find_map(|d| self.match_description(d))
    }
}

impl Default for VendorTable {
    fn default() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(fragment, vendor)| VendorEntry::new(*fragment, *vendor))
                .collect(),
        )
    }
}
