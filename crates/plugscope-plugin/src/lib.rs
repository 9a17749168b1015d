// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-candidate static analysis: manifest parsing, component inventory,
//! requirement detection and categorization.

pub mod category;
pub mod inventory;
pub mod manifest;
pub mod requirements;

pub use category::{CATEGORIES, FALLBACK_CATEGORY, categorize};
pub use inventory::inventory_for;
pub use manifest::{parse_manifest, slugify};
pub use requirements::{RequirementDetector, TierPolicy};
