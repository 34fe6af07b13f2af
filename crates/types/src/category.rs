//! The closed set of attachment categories and their catalog data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attachment category. Also the key of the alignment rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hotend,
    Skirt,
    FanGuard,
    Gantry,
    GantryClip,
    PartCooling,
    Wing,
    Probe,
    Adxl,
    DirectDrive,
    Spacer,
}

/// How an attachment's interface is expressed in its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// Circular hole pattern on a planar face.
    Holes,
    /// Push-fit duct between a pair of slide faces.
    Slide,
}

/// Catalog entry for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    /// Display title for menus.
    pub title: &'static str,
    /// Category this one mounts onto; `None` means the base part.
    pub parent: Option<Category>,
    /// Whether library files are filtered by `left`/`right` from the slot name.
    pub side_filter: bool,
    pub mount: MountKind,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Hotend,
        Category::Skirt,
        Category::FanGuard,
        Category::Gantry,
        Category::GantryClip,
        Category::PartCooling,
        Category::Wing,
        Category::Probe,
        Category::Adxl,
        Category::DirectDrive,
        Category::Spacer,
    ];

    pub fn spec(self) -> CategorySpec {
        use MountKind::{Holes, Slide};
        let (title, parent, side_filter, mount) = match self {
            Category::Hotend => ("Hotend", None, false, Holes),
            Category::Skirt => ("Skirt", None, false, Holes),
            Category::FanGuard => ("Fan Guard", Some(Category::Skirt), false, Holes),
            Category::Gantry => ("Gantry Adapter", None, false, Holes),
            Category::GantryClip => ("Gantry Clip", Some(Category::Gantry), false, Holes),
            Category::PartCooling => ("Part Cooling", None, true, Slide),
            Category::Wing => ("Wing", None, true, Holes),
            Category::Probe => ("Probe", None, false, Holes),
            Category::Adxl => ("ADXL Mount", None, false, Holes),
            Category::DirectDrive => ("Direct Drive", None, false, Holes),
            Category::Spacer => ("Spacer", None, false, Holes),
        };
        CategorySpec {
            title,
            parent,
            side_filter,
            mount,
        }
    }

    /// Lowercase identifier; also the category's directory in the part library.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Hotend => "hotend",
            Category::Skirt => "skirt",
            Category::FanGuard => "fanguard",
            Category::Gantry => "gantry",
            Category::GantryClip => "gantryclip",
            Category::PartCooling => "partcooling",
            Category::Wing => "wing",
            Category::Probe => "probe",
            Category::Adxl => "adxl",
            Category::DirectDrive => "directdrive",
            Category::Spacer => "spacer",
        }
    }

    /// Whether a part of this category may mount on a part of category `owner`
    /// (`None` for the base).
    pub fn mounts_on(self, owner: Option<Category>) -> bool {
        self.spec().parent == owner
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attachment category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or(UnknownCategory(s.to_string()))
    }
}
